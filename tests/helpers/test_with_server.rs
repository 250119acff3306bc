#[macro_export]
macro_rules! test_with_server {
    ($name:ident, $strategy:expr, |$server:ident, $ctx_state:ident, $config:ident| $body:block) => {

        #[tokio::test(flavor="multi_thread")]
        #[serial_test::serial]
        #[allow(unused_variables)]
        async fn $name() {
            use axum_test::{TestServer, TestServerConfig};
            use fairytale_server::config::{AppConfig, LockConfig};
            use fairytale_server::database::client::{Database, DbConfig};
            use fairytale_server::middleware::mw_ctx::create_ctx_state;
            use fairytale_server::utils::lock::RetryPolicy;
            use futures::FutureExt;
            use std::panic::resume_unwind;
            use std::time::Duration;

            let $config = AppConfig {
                db_namespace: "test".to_string(),
                db_database: "test".to_string(),
                db_password: None,
                db_username: None,
                db_url: "mem://".to_string(),
                http_port: 0,
                is_development: false,
                sentry_project_link: None,
                lock: LockConfig {
                    strategy: $strategy,
                    wait_timeout: Duration::from_secs(60),
                    lease: Duration::from_secs(30),
                    retry: RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(20)),
                    redis_url: None,
                },
            };

            let $ctx_state = {
                let db = Database::connect(DbConfig {
                    url: &$config.db_url,
                    database: &$config.db_database,
                    namespace: &$config.db_namespace,
                    password: $config.db_password.as_deref(),
                    username: $config.db_username.as_deref(),
                })
                .await
                .expect("db connects");

                db.run_migrations().await.unwrap();
                create_ctx_state(db, &$config).await.unwrap()
            };

            let routes_all = fairytale_server::init::main_router(&$ctx_state);

            let $server = TestServer::new_with_config(
                routes_all,
                TestServerConfig {
                    transport: None,
                    save_cookies: false,
                    expect_success_by_default: false,
                    restrict_requests_with_http_schema: false,
                    default_content_type: None,
                    default_scheme: None,
                },
            )
            .expect("Failed to create test server");

            let test_result = std::panic::AssertUnwindSafe(async {
                (|| async $body)().await;
            })
            .catch_unwind()
            .await;

            $ctx_state.db.client
                .query(format!("REMOVE DATABASE {};", $config.db_database))
                .await
                .expect("failed to remove database");

            if let Err(panic) = test_result {
                resume_unwind(panic);
            }
        }
    };
}
