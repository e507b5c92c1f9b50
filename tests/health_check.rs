mod common;

#[tokio::test]
async fn health_check_works() {
    let app = common::spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn health_check_needs_no_credentials_under_mount_path() {
    let mut configuration = common::test_configuration();
    configuration.service.mount_path = "/api".to_string();
    let app = common::spawn_app_with_configuration(configuration).await;
    let client = reqwest::Client::new();

    let response = client.get(app.url("/health_check")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(app.url("/api/template"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}
