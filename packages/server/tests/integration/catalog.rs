use crate::common::{TestApp, routes};

mod tags {
    use super::*;

    #[tokio::test]
    async fn tags_are_listed_without_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::TAGS).await;

        assert_eq!(res.status, 200);
        let slugs: Vec<&str> = res
            .body
            .as_array()
            .expect("tags should be an array")
            .iter()
            .map(|t| t["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["breakfast", "lunch", "dinner"]);
    }

    #[tokio::test]
    async fn single_tag_can_be_fetched() {
        let app = TestApp::spawn().await;
        let id = app.tag_id("lunch").await;

        let res = app.get_without_token(&routes::tag(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Lunch");
        assert_eq!(res.body["color"], "#49B64E");
    }

    #[tokio::test]
    async fn unknown_tag_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::tag(99_999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod ingredients {
    use super::*;

    #[tokio::test]
    async fn ingredients_filter_by_case_insensitive_prefix() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?name=MIL", routes::INGREDIENTS))
            .await;

        assert_eq!(res.status, 200);
        let items = res.body.as_array().expect("ingredients should be an array");
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i["name"] == "milk"));

        let res = app
            .get_without_token(&format!("{}?name=sun", routes::INGREDIENTS))
            .await;
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Sunflower oil");
    }

    #[tokio::test]
    async fn ingredient_prefix_does_not_match_in_the_middle() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?name=lour", routes::INGREDIENTS))
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn like_wildcards_in_the_search_are_literal() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?name=%25", routes::INGREDIENTS))
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_ingredients_are_listed_without_a_filter() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::INGREDIENTS).await;

        assert_eq!(res.status, 200);
        let items = res.body.as_array().unwrap();
        assert_eq!(items.len(), 7);
    }

    #[tokio::test]
    async fn single_ingredient_can_be_fetched() {
        let app = TestApp::spawn().await;
        let id = app.ingredient_id("eggs", "pcs").await;

        let res = app.get_without_token(&routes::ingredient(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["measurement_unit"], "pcs");

        let missing = app.get_without_token(&routes::ingredient(99_999)).await;
        assert_eq!(missing.status, 404);
    }
}
