//! Cursor-following over relay connections

use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::{Connection, GraphqlClient, GraphqlError, GraphqlRequest};

/// Fetch every page of a connection query
///
/// `build` receives the `after` cursor (`None` for the first page) and
/// `connection` projects the typed `data` payload onto its connection.
/// Stops when `hasNextPage` is false or a cursor repeats.
pub async fn fetch_all<T, D>(
    client: &dyn GraphqlClient,
    build: impl Fn(Option<&str>) -> GraphqlRequest,
    connection: impl Fn(D) -> Connection<T>,
) -> Result<Vec<T>, GraphqlError>
where
    D: DeserializeOwned,
{
    let mut nodes = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let request = build(cursor.as_deref());
        let data: D = client.execute(&request).await?.into_data()?;
        let page = connection(data);
        pages += 1;

        let has_next = page.page_info.has_next_page;
        let end_cursor = page.page_info.end_cursor.clone();
        nodes.extend(page.into_nodes());

        match end_cursor {
            Some(next) if has_next && seen.insert(next.clone()) => cursor = Some(next),
            _ if has_next => {
                warn!(pages, "fetch_all: hasNextPage set without a new cursor, stopping");
                break;
            }
            _ => break,
        }
    }

    debug!(pages, count = nodes.len(), "fetch_all: done");
    Ok(nodes)
}
