//! Loading lists for display

use tracing::{debug, warn};

use super::{transpose, Column, DisplayRow, List, ListMeta};
use crate::api::CommuneApi;
use crate::error::{AccessError, Result};
use crate::session::Session;

/// Message shown when a commune's lists cannot be loaded
pub const LIST_LOAD_ERROR: &str = "Failed to fetch lists.";

/// A list with its rows already transposed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayList {
    pub meta: ListMeta,
    pub columns: Vec<Column>,
    pub rows: Vec<DisplayRow>,
}

impl From<List> for DisplayList {
    fn from(list: List) -> Self {
        let rows = transpose(&list.columns, &list.rows);
        Self {
            meta: list.meta,
            columns: list.columns,
            rows,
        }
    }
}

/// State of a commune's list page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListsView {
    #[default]
    Loading,
    Failed(String),
    Ready(Vec<DisplayList>),
}

impl ListsView {
    pub fn lists(&self) -> &[DisplayList] {
        match self {
            ListsView::Ready(lists) => lists,
            _ => &[],
        }
    }
}

/// Fetch every list of a commune and transpose it.
///
/// Nothing is transposed unless the fetch succeeds.
pub async fn load_lists(
    api: &dyn CommuneApi,
    commune_id: &str,
    session: Option<&Session>,
) -> ListsView {
    match api.fetch_lists(commune_id, session).await {
        Ok(lists) => {
            debug!(commune_id, count = lists.len(), "Lists loaded");
            ListsView::Ready(lists.into_iter().map(DisplayList::from).collect())
        }
        Err(e) => {
            warn!(commune_id, error = %e, "Failed to fetch lists");
            ListsView::Failed(LIST_LOAD_ERROR.to_string())
        }
    }
}

/// Fetch a single list by its post id and transpose it
pub async fn load_list(
    api: &dyn CommuneApi,
    list_id: &str,
    session: Option<&Session>,
) -> Result<DisplayList> {
    api.fetch_list(list_id, session)
        .await
        .map(DisplayList::from)
        .map_err(|e| AccessError::ListFetchFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::PLACEHOLDER;
    use crate::test_utils::FakeApi;
    use serde_json::json;

    fn tools_list() -> List {
        serde_json::from_value(json!({
            "metaData": {"post_id": 4, "title": "Tools"},
            "columns": [
                {"attribute_name": "tool", "attribute_type": "text"},
                {"attribute_name": "owner", "attribute_type": "text"}
            ],
            "rows": [{"tool": "drill, saw, ladder"}, {"owner": "ana, ben"}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_lists_transposes_each_list() {
        let api = FakeApi::with_role(None).with_lists("c1", Ok(vec![tools_list()]));

        let session = Session::new("u1", "tok");
        let view = load_lists(&api, "c1", Some(&session)).await;
        let lists = view.lists();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].meta.title, "Tools");
        assert_eq!(lists[0].rows.len(), 3);
        assert_eq!(lists[0].rows[1].get("owner"), Some("ben"));
        assert_eq!(lists[0].rows[2].get("owner"), Some(PLACEHOLDER));
        assert_eq!(api.authorized_list_fetches(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_error_message() {
        let api = FakeApi::with_role(None).with_lists("c1", Err("db down".into()));

        let view = load_lists(&api, "c1", None).await;
        assert_eq!(view, ListsView::Failed(LIST_LOAD_ERROR.to_string()));
        assert!(view.lists().is_empty());
        assert_eq!(api.list_fetches(), 1);
    }

    #[tokio::test]
    async fn test_commune_without_lists_is_ready_and_empty() {
        let api = FakeApi::with_role(None);
        assert_eq!(load_lists(&api, "c2", None).await, ListsView::Ready(vec![]));
    }

    #[tokio::test]
    async fn test_load_single_list() {
        let api = FakeApi::with_role(None).with_lists("c1", Ok(vec![tools_list()]));

        let list = load_list(&api, "4", None).await.unwrap();
        assert_eq!(list.rows[0].get("tool"), Some("drill"));

        let err = load_list(&api, "5", None).await.unwrap_err();
        assert!(matches!(err, AccessError::ListFetchFailed(_)));
    }

    #[test]
    fn test_lists_view_starts_loading() {
        assert_eq!(ListsView::default(), ListsView::Loading);
    }
}
