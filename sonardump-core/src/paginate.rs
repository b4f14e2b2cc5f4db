// Concatenating paginated listings

use sonardump_client::error::Result as ClientResult;
use sonardump_client::{ClientError, Page};
use std::future::Future;

/// Items from every page that could be fetched, plus the error that cut
/// the listing short, if any.
#[derive(Debug)]
pub struct MergedPages<T> {
    pub items: Vec<T>,
    pub error: Option<ClientError>,
}

impl<T> MergedPages<T> {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Follow a listing from its first page to `total_pages`, in server order.
///
/// A failing page stops the merge; everything gathered until then is kept.
pub async fn merge_pages<T, F, Fut>(first: Page<T>, mut fetch: F) -> MergedPages<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ClientResult<Page<T>>>,
{
    let mut page_index = first.page_index;
    let total_pages = first.total_pages;
    let mut items = first.items;

    while page_index < total_pages {
        match fetch(page_index + 1).await {
            Ok(page) => {
                // A server that does not advance would keep us here forever
                if page.page_index <= page_index {
                    break;
                }
                page_index = page.page_index;
                items.extend(page.items);
            }
            Err(e) => {
                return MergedPages {
                    items,
                    error: Some(e),
                };
            }
        }
    }

    MergedPages { items, error: None }
}

/// Fetch page 1 and merge the rest. Only a failing first page is an `Err`.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> ClientResult<MergedPages<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ClientResult<Page<T>>>,
{
    let first = fetch(1).await?;
    Ok(merge_pages(first, fetch).await)
}
