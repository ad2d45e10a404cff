//! HTML parsing for registry pages
//!
//! This module handles the two page shapes served by the registry:
//! - Results pages: the results table, its paging control, and one row per institution
//! - Detail pages: the address block and the website entry of one institution
//!
//! Parsed documents never leave this module's functions across an `.await`;
//! callers receive plain owned values.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::crawler::fetcher::ID_PARAM;

/// Element id of the results table
pub const RESULTS_TABLE_ID: &str = "ctl00_cphCollegeNavBody_ucResultsMain_tblResults";

/// Element id of the paging control under the results table
pub const PAGING_CONTROLS_ID: &str = "ctl00_cphCollegeNavBody_ucResultsMain_divPagingControls";

/// Classes of the alternating result rows
const RESULT_ROW_SELECTOR: &str = ".resultsW, .resultsY";

/// Paging control text shown when every result fits on one page
pub const ALL_RESULTS_TEXT: &str = "Showing All Results";

/// Own text of the paging control's "next page" affordance
pub const NEXT_PAGE_TEXT: &str = "Next Page »";

/// Label preceding an institution's website on its detail page
pub const WEBSITE_LABEL: &str = "Website:";

/// Errors raised when a detail page does not have the expected shape
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected element missing from page: {0}")]
    MissingElement(&'static str),
}

/// An institution found on a results page, pending its detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionStub {
    /// Display name from the results row
    pub name: String,

    /// Opaque registry identifier used to request the detail page
    pub identifier: String,
}

/// Fields taken from an institution's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionDetails {
    pub address: String,
    pub website: String,
}

/// A parsed page of search results
pub struct ResultsPage {
    document: Html,
}

impl ResultsPage {
    /// Parses the HTML of a results page
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Returns true if the results table has a body
    ///
    /// Regions without matching institutions, and pages past the last one, are
    /// served with an empty results table.
    pub fn has_results_body(&self) -> bool {
        self.results_body().is_some()
    }

    /// Returns true if the results body holds at least one result row
    ///
    /// Rows are counted whether or not their link can be read.
    pub fn has_result_rows(&self) -> bool {
        let Some(body) = self.results_body() else {
            return false;
        };
        let Ok(row_selector) = Selector::parse(RESULT_ROW_SELECTOR) else {
            return false;
        };
        body.select(&row_selector).next().is_some()
    }

    /// Whitespace-normalized text of the paging control, empty if absent
    pub fn paging_text(&self) -> String {
        self.paging_controls()
            .map(normalized_text)
            .unwrap_or_default()
    }

    /// Returns true if the paging control offers a "next page" link
    pub fn has_next_page_link(&self) -> bool {
        let Some(controls) = self.paging_controls() else {
            return false;
        };

        controls
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|element| own_text(element).contains(NEXT_PAGE_TEXT))
    }

    /// Extracts one stub per result row
    ///
    /// Rows whose detail link or identifier cannot be read are skipped. A page
    /// without a results body yields no stubs.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL for resolving relative detail links
    pub fn extract_stubs(&self, base_url: &Url) -> Vec<InstitutionStub> {
        let Some(body) = self.results_body() else {
            return Vec::new();
        };
        let Ok(row_selector) = Selector::parse(RESULT_ROW_SELECTOR) else {
            return Vec::new();
        };

        let mut stubs = Vec::new();
        for (index, row) in body.select(&row_selector).enumerate() {
            match extract_stub(row, base_url) {
                Some(stub) => {
                    tracing::debug!("{} id = {}", stub.name, stub.identifier);
                    stubs.push(stub);
                }
                None => {
                    tracing::warn!("Skipping result row {}: no readable institution link", index);
                }
            }
        }

        stubs
    }

    fn results_body(&self) -> Option<ElementRef<'_>> {
        let table = self.element_by_id(RESULTS_TABLE_ID)?;
        table.children().filter_map(ElementRef::wrap).next()
    }

    fn paging_controls(&self) -> Option<ElementRef<'_>> {
        self.element_by_id(PAGING_CONTROLS_ID)
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(&format!("#{}", id)).ok()?;
        self.document.select(&selector).next()
    }
}

/// Infers the total number of result pages
///
/// A known limit is returned unchanged. Otherwise the paging control either
/// reports that all results are shown (one page), or ends with the page count.
/// 0 means the limit is still unknown.
///
/// # Example
///
/// ```
/// use institution_finder::crawler::estimate_page_limit;
///
/// assert_eq!(estimate_page_limit("Showing All Results", 0), 1);
/// assert_eq!(estimate_page_limit("Showing Results 1 - 15 of 77 | Page 1 of 6", 0), 6);
/// assert_eq!(estimate_page_limit("Next Page »", 0), 0);
/// assert_eq!(estimate_page_limit("Page 1 of 6", 4), 4);
/// ```
pub fn estimate_page_limit(paging_text: &str, current_limit: u32) -> u32 {
    if current_limit != 0 {
        return current_limit;
    }

    if paging_text == ALL_RESULTS_TEXT {
        return 1;
    }

    let final_token = paging_text.split_whitespace().last().unwrap_or_default();
    match final_token.parse::<u32>() {
        Ok(limit) => limit,
        Err(_) => {
            tracing::debug!(
                "Failed to determine page limit from paging controls. Checked token = {}",
                final_token
            );
            0
        }
    }
}

/// Extracts address and website from an institution's detail page
///
/// The address is the first text directly inside the element wrapping the
/// `.headerlg` name heading. The website is the text of the element following
/// the `Website:` label, given an `https://` scheme when it has none.
pub fn extract_details(html: &str) -> Result<InstitutionDetails, ParseError> {
    let document = Html::parse_document(html);

    let address = extract_address(&document)?;
    let website = extract_website(&document)?;

    Ok(InstitutionDetails { address, website })
}

fn extract_stub(row: ElementRef<'_>, base_url: &Url) -> Option<InstitutionStub> {
    // 0 = info button, 1 = institution link, 2 = add button
    let cell = row.children().filter_map(ElementRef::wrap).nth(1)?;
    let link_selector = Selector::parse("[href]").ok()?;
    let link = cell.select(&link_selector).next()?;

    let name = normalized_text(link);
    let href = link.value().attr("href")?;
    let identifier = query_param(href, base_url, ID_PARAM)?;

    if name.is_empty() || identifier.is_empty() {
        return None;
    }

    Some(InstitutionStub { name, identifier })
}

/// Reads a query parameter from a possibly relative link
fn query_param(href: &str, base_url: &Url, name: &str) -> Option<String> {
    let url = base_url.join(href.trim()).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn extract_address(document: &Html) -> Result<String, ParseError> {
    let heading = Selector::parse(".headerlg")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .ok_or(ParseError::MissingElement("name heading"))?;
    let block = heading
        .parent()
        .and_then(ElementRef::wrap)
        .ok_or(ParseError::MissingElement("header block"))?;

    block
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(ParseError::MissingElement("address"))
}

fn extract_website(document: &Html) -> Result<String, ParseError> {
    // The label sits in a table cell; scripts and prose mentioning it are ignored
    let label = Selector::parse("td")
        .ok()
        .and_then(|cells| {
            document
                .select(&cells)
                .find(|cell| own_text(*cell).contains(WEBSITE_LABEL))
        })
        .ok_or(ParseError::MissingElement("website label"))?;
    let value = label
        .next_siblings()
        .find_map(ElementRef::wrap)
        .ok_or(ParseError::MissingElement("website"))?;

    let website = normalized_text(value);
    if website.is_empty() {
        return Err(ParseError::MissingElement("website"));
    }

    if website.starts_with("http://") || website.starts_with("https://") {
        Ok(website)
    } else {
        Ok(format!("https://{}", website))
    }
}

/// Text of the element's direct text children
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// All descendant text with runs of whitespace collapsed to single spaces
fn normalized_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
