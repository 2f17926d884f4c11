//! End-to-end requests through the full router.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common::{TestApp, TEST_PASSWORD};
use postboard::blog::repository::PostFilter;
use postboard::blog::BlogRepository;
use postboard::routes;
use tower::ServiceExt;

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    routes::app(app.state.clone()).oneshot(request).await.unwrap()
}

async fn get(app: &TestApp, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post_form(app: &TestApp, uri: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_public_pages_render() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let cats = app.group("Cats", "cats").await;
    let id = app.post(&leo, "Whiskers everywhere", Some(&cats)).await;

    for uri in [
        "/".to_string(),
        "/group/cats/".to_string(),
        "/profile/leo/".to_string(),
        format!("/posts/{id}/"),
    ] {
        let response = get(&app, &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        let body = body_text(response).await;
        assert!(body.contains("Whiskers everywhere"), "GET {uri}");
    }
}

#[tokio::test]
async fn test_missing_resources_are_404() {
    let app = TestApp::new();
    app.user("leo");

    for uri in [
        "/group/bat/",
        "/profile/nobody/",
        "/posts/999/",
        "/posts/abc/",
        "/no/such/page/",
        "/assets/css/missing.css",
    ] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {uri}");
    }
}

#[tokio::test]
async fn test_anonymous_writers_are_sent_to_login() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let id = app.post(&leo, "hello", None).await;

    let response = get(&app, "/create/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=%2Fcreate%2F");

    let response = post_form(&app, &format!("/posts/{id}/edit/"), "text=hijack", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/auth/login/?next=%2Fposts%2F{id}%2Fedit%2F")
    );

    let post = app.repo().find_post(id).await.unwrap().unwrap();
    assert_eq!(post.text, "hello");
}

#[tokio::test]
async fn test_create_redirects_to_profile() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let cookie = app.cookie_for(&leo);

    let response = get(&app, "/create/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_form(&app, "/create/", "text=Fresh+post&group=", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/leo/");

    let home = body_text(get(&app, "/", None).await).await;
    assert!(home.contains("Fresh post"));
}

#[tokio::test]
async fn test_blank_post_rerenders_form_with_error() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let cookie = app.cookie_for(&leo);

    let response = post_form(&app, "/create/", "text=+++&group=", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));

    assert_eq!(app.repo().count_posts(&PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_author_edits_and_others_bounce() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let mia = app.user("mia");
    let cats = app.group("Cats", "cats").await;
    let dogs = app.group("Dogs", "dogs").await;
    let id = app.post(&leo, "leo original", Some(&cats)).await;
    let before = app.repo().find_post(id).await.unwrap().unwrap();
    let detail = format!("/posts/{id}/");
    let edit = format!("/posts/{id}/edit/");

    let mia_cookie = app.cookie_for(&mia);
    let response = get(&app, &edit, Some(&mia_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    let hijack = format!("text=mia+was+here&group={}", dogs.id.get());
    let response = post_form(&app, &edit, &hijack, Some(&mia_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);
    assert_eq!(app.repo().find_post(id).await.unwrap().unwrap(), before);

    let leo_cookie = app.cookie_for(&leo);
    let response = get(&app, &edit, Some(&leo_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("leo original"));

    let response = post_form(&app, &edit, "text=leo+revised&group=", Some(&leo_cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);
    assert_eq!(
        app.repo().find_post(id).await.unwrap().unwrap().text,
        "leo revised"
    );
}

#[tokio::test]
async fn test_blank_edit_rerenders_form_and_keeps_post() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let cats = app.group("Cats", "cats").await;
    let id = app.post(&leo, "keep me", Some(&cats)).await;
    let before = app.repo().find_post(id).await.unwrap().unwrap();
    let cookie = app.cookie_for(&leo);

    let response = post_form(&app, &format!("/posts/{id}/edit/"), "text=+++&group=", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));

    assert_eq!(app.repo().find_post(id).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn test_edit_link_only_for_author() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let mia = app.user("mia");
    let id = app.post(&leo, "hello", None).await;
    let uri = format!("/posts/{id}/");
    let edit_link = format!("/posts/{id}/edit/");

    let as_leo = body_text(get(&app, &uri, Some(&app.cookie_for(&leo))).await).await;
    assert!(as_leo.contains(&edit_link));

    let as_mia = body_text(get(&app, &uri, Some(&app.cookie_for(&mia))).await).await;
    assert!(!as_mia.contains(&edit_link));

    let anonymous = body_text(get(&app, &uri, None).await).await;
    assert!(!anonymous.contains(&edit_link));
}

#[tokio::test]
async fn test_page_query_variants() {
    let app = TestApp::new();
    let leo = app.user("leo");
    for i in 0..13 {
        app.post(&leo, &format!("numbered post {i}"), None).await;
    }

    let cases = [
        ("/", "Page 1 of 2"),
        ("/?page=2", "Page 2 of 2"),
        ("/?page=99", "Page 2 of 2"),
        ("/?page=last", "Page 2 of 2"),
        ("/?page=abc", "Page 1 of 2"),
        ("/?page=0", "Page 1 of 2"),
    ];
    for (uri, expected) in cases {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        assert!(body_text(response).await.contains(expected), "GET {uri}");
    }

    let second = body_text(get(&app, "/?page=2", None).await).await;
    assert!(second.contains("numbered post 0"));
    assert!(!second.contains("numbered post 12"));
}

#[tokio::test]
async fn test_signup_login_logout() {
    let app = TestApp::new();

    let response = post_form(
        &app,
        "/auth/signup/",
        "username=newbie&password1=long-enough&password2=long-enough",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let response = post_form(
        &app,
        "/auth/signup/",
        "username=newbie&password1=long-enough&password2=long-enough",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("already exists"));

    let response = post_form(&app, "/auth/login/", "username=newbie&password=wrong-one", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("correct username and password"));

    let response = post_form(
        &app,
        "/auth/login/",
        "username=newbie&password=long-enough&next=%2Fcreate%2F",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/create/");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    assert_eq!(get(&app, "/create/", Some(&cookie)).await.status(), StatusCode::OK);

    let response = post_form(&app, "/auth/logout/", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(get(&app, "/create/", Some(&cookie)).await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_with_fixture_password() {
    let app = TestApp::new();
    app.user("leo");

    let body = format!("username=leo&password={TEST_PASSWORD}");
    let response = post_form(&app, "/auth/login/", &body, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_stylesheet_is_served() {
    let app = TestApp::new();
    let response = get(&app, "/assets/css/site.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
}

#[tokio::test]
async fn test_editing_missing_post_is_404() {
    let app = TestApp::new();
    let leo = app.user("leo");
    let cookie = app.cookie_for(&leo);

    assert_eq!(
        get(&app, "/posts/999/edit/", Some(&cookie)).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        post_form(&app, "/posts/999/edit/", "text=x&group=", Some(&cookie))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}
