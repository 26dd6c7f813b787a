use crate::error::Result;
use std::future::Future;

/// Collect every page of a cursor-paginated listing.
///
/// `fetch` gets `None` for the first page and the previous page's cursor after
/// that. Listing stops at the first page without a next cursor.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>>,
{
    let mut items = Vec::new();
    let mut cursor = None;

    loop {
        let (mut page, next) = fetch(cursor).await?;
        items.append(&mut page);

        match next {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_follows_cursors_until_last_page() {
        let pages: HashMap<Option<String>, (Vec<String>, Option<String>)> = HashMap::from([
            (None, (strings(&["a", "b"]), Some("p2".to_string()))),
            (Some("p2".to_string()), (strings(&["c"]), Some("p3".to_string()))),
            (Some("p3".to_string()), (strings(&["d", "e"]), None)),
        ]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let items = collect_pages(|cursor: Option<String>| {
            let seen = seen.clone();
            let page = pages.get(&cursor).cloned();
            async move {
                seen.lock().unwrap().push(cursor.clone());
                page.ok_or_else(|| Error::from(format!("unexpected cursor {:?}", cursor)))
            }
        })
        .await
        .unwrap();

        assert_eq!(items, strings(&["a", "b", "c", "d", "e"]));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("p2".to_string()), Some("p3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_page_without_cursor() {
        let mut calls = 0;

        let items = collect_pages(|_| {
            calls += 1;
            async { Ok::<_, Error>((vec![1, 2, 3], None)) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_error_on_later_page_is_returned() {
        let result: Result<Vec<u32>> = collect_pages(|cursor: Option<String>| async move {
            match cursor {
                None => Ok((vec![1], Some("p2".to_string()))),
                Some(_) => Err(Error::from("quota exceeded")),
            }
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "quota exceeded");
    }
}
