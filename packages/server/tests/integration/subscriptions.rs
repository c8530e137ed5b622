use serde_json::json;

use crate::common::{TestApp, routes};

mod following {
    use super::*;

    #[tokio::test]
    async fn subscribing_returns_the_author_with_a_recipe_preview() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        for i in 0..4 {
            app.create_flour_recipe(&bob.token, &format!("Loaf {i}")).await;
        }

        let res = app
            .post_with_token(
                &format!("{}?recipes_limit=2", routes::subscribe(bob.id)),
                &json!({}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 201, "subscribe failed: {}", res.text);
        assert_eq!(res.body["id"], bob.id);
        assert_eq!(res.body["username"], "bob");
        assert_eq!(res.body["is_subscribed"], true);
        assert_eq!(res.body["recipes_count"], 4);
        let preview = res.body["recipes"].as_array().unwrap();
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0]["name"], "Loaf 3");
        assert_eq!(preview[1]["name"], "Loaf 2");
    }

    #[tokio::test]
    async fn cannot_subscribe_to_yourself() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(&routes::subscribe(alice.id), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "SELF_SUBSCRIPTION");
    }

    #[tokio::test]
    async fn subscribing_twice_is_a_conflict() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;

        let first = app
            .post_with_token(&routes::subscribe(bob.id), &json!({}), &alice.token)
            .await;
        assert_eq!(first.status, 201);

        let second = app
            .post_with_token(&routes::subscribe(bob.id), &json!({}), &alice.token)
            .await;
        assert_eq!(second.status, 409);
        assert_eq!(second.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn subscribing_to_an_unknown_author_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .post_with_token(&routes::subscribe(99_999), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unsubscribing_removes_the_follow() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        app.post_with_token(&routes::subscribe(bob.id), &json!({}), &alice.token)
            .await;

        let res = app
            .delete_with_token(&routes::subscribe(bob.id), &alice.token)
            .await;
        assert_eq!(res.status, 204);

        let profile = app.get_with_token(&routes::user(bob.id), &alice.token).await;
        assert_eq!(profile.body["is_subscribed"], false);

        let again = app
            .delete_with_token(&routes::subscribe(bob.id), &alice.token)
            .await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn follow_state_shows_on_profiles_and_recipe_authors() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_flour_recipe(&bob.token, "Bread").await;
        app.post_with_token(&routes::subscribe(bob.id), &json!({}), &alice.token)
            .await;

        let profile = app.get_with_token(&routes::user(bob.id), &alice.token).await;
        assert_eq!(profile.body["is_subscribed"], true);

        let recipe = app.get_with_token(&routes::recipe(id), &alice.token).await;
        assert_eq!(recipe.body["author"]["is_subscribed"], true);

        let anonymous = app.get_without_token(&routes::recipe(id)).await;
        assert_eq!(anonymous.body["author"]["is_subscribed"], false);

        let own = app.get_with_token(&routes::recipe(id), &bob.token).await;
        assert_eq!(own.body["author"]["is_subscribed"], false);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn subscription_list_is_paginated_and_previews_are_bounded() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let mut authors = Vec::new();
        for name in ["bob", "carol", "dave", "erin"] {
            let author = app.create_authenticated_user(name, "securepass").await;
            app.create_flour_recipe(&author.token, &format!("{name}'s bread"))
                .await;
            app.create_flour_recipe(&author.token, &format!("{name}'s cake"))
                .await;
            let res = app
                .post_with_token(&routes::subscribe(author.id), &json!({}), &alice.token)
                .await;
            assert_eq!(res.status, 201);
            authors.push(author.id);
        }

        let page1 = app
            .get_with_token(
                &format!("{}?recipes_limit=1", routes::SUBSCRIPTIONS),
                &alice.token,
            )
            .await;
        assert_eq!(page1.status, 200, "list failed: {}", page1.text);
        let data = page1.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(page1.body["pagination"]["total"], 4);
        assert_eq!(page1.body["pagination"]["total_pages"], 2);
        // Newest subscription first.
        assert_eq!(data[0]["id"], authors[3]);
        for entry in data {
            assert_eq!(entry["recipes"].as_array().unwrap().len(), 1);
            assert_eq!(entry["recipes_count"], 2);
            assert_eq!(entry["is_subscribed"], true);
        }

        let page2 = app
            .get_with_token(&format!("{}?page=2", routes::SUBSCRIPTIONS), &alice.token)
            .await;
        let data = page2.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], authors[0]);
        assert_eq!(data[0]["recipes"].as_array().unwrap().len(), 2);

        let none = app
            .get_with_token(
                &format!("{}?recipes_limit=0", routes::SUBSCRIPTIONS),
                &alice.token,
            )
            .await;
        assert!(
            none.body["data"]
                .as_array()
                .unwrap()
                .iter()
                .all(|e| e["recipes"].as_array().unwrap().is_empty() && e["recipes_count"] == 2)
        );
    }

    #[tokio::test]
    async fn negative_recipes_limit_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .get_with_token(
                &format!("{}?recipes_limit=-1", routes::SUBSCRIPTIONS),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_recipes_limit_is_capped() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        app.create_flour_recipe(&bob.token, "Bread").await;

        let res = app
            .post_with_token(
                &format!("{}?recipes_limit={}", routes::subscribe(bob.id), u64::MAX),
                &json!({}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 201, "subscribe failed: {}", res.text);
        assert_eq!(res.body["recipes"].as_array().unwrap().len(), 1);

        let list = app
            .get_with_token(
                &format!("{}?recipes_limit={}", routes::SUBSCRIPTIONS, u64::MAX),
                &alice.token,
            )
            .await;
        assert_eq!(list.status, 200, "list failed: {}", list.text);
        assert_eq!(list.body["data"][0]["recipes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn page_number_past_the_offset_range_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .get_with_token(
                &format!("{}?page={}", routes::SUBSCRIPTIONS, u64::MAX),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn subscriptions_require_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::SUBSCRIPTIONS).await;

        assert_eq!(res.status, 401);
    }
}
