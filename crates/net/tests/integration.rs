//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use apkidx_net::*;
    use apkidx_types::{BasicCredentials, Mirror};
    use httpmock::prelude::*;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    const INDEX_PATH: &str = "/main/x86_64/APKINDEX.tar.gz";

    fn request() -> IndexRequest {
        IndexRequest {
            repo_path: "main/x86_64".to_string(),
            file_name: "APKINDEX.tar.gz".to_string(),
            stagger: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_drops_failing_mirrors() {
        let good = MockServer::start();
        let missing = MockServer::start();

        let good_mock = good.mock(|when, then| {
            when.method(GET).path(INDEX_PATH);
            then.status(200).body(b"index bytes");
        });
        missing.mock(|when, then| {
            when.method(GET).path(INDEX_PATH);
            then.status(404).body("Not Found");
        });

        let mirrors = vec![
            Mirror::parse(&missing.base_url(), 0).unwrap(),
            Mirror::parse(&good.base_url(), 1).unwrap(),
            Mirror::parse("http://127.0.0.1:9", 2).unwrap(),
        ];

        let client = NetClient::with_defaults().unwrap();
        let (tx, mut rx) = mpsc::channel(mirrors.len());
        let report = fetch_all(&client, &mirrors, &request(), tx).await;

        good_mock.assert();
        assert_eq!(
            report,
            FetchReport {
                dispatched: 3,
                delivered: 1,
                failed: 2,
            }
        );

        let fetched = rx.recv().await.unwrap();
        assert_eq!(fetched.mirror.position(), 1);
        assert_eq!(fetched.blob.as_ref(), b"index bytes");
        // every sender is gone once fetch_all returns
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_all_sends_basic_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(INDEX_PATH)
                .header("Authorization", "Basic dXNlcjpwYXNz");
            then.status(200).body(b"private index");
        });

        let mirror = Mirror::parse(&server.base_url(), 0)
            .unwrap()
            .with_credentials(Some(BasicCredentials::new("user", "pass")));

        let client = NetClient::with_defaults().unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let report = fetch_all(&client, &[mirror], &request(), tx).await;

        mock.assert();
        assert_eq!(report.delivered, 1);
        assert_eq!(rx.recv().await.unwrap().blob.as_ref(), b"private index");
    }

    #[tokio::test]
    async fn test_fetch_all_staggers_by_position() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(INDEX_PATH);
            then.status(200).body(b"index bytes");
        });

        let stagger = Duration::from_millis(120);
        let request = IndexRequest {
            stagger,
            ..request()
        };
        let mirrors: Vec<Mirror> = (0..3)
            .map(|i| Mirror::parse(&server.base_url(), i).unwrap())
            .collect();

        let client = NetClient::with_defaults().unwrap();
        let (tx, mut rx) = mpsc::channel(mirrors.len());
        let start = Instant::now();
        let (report, arrivals) = tokio::join!(fetch_all(&client, &mirrors, &request, tx), async {
            let mut arrivals = Vec::new();
            while let Some(fetched) = rx.recv().await {
                arrivals.push((fetched.mirror.position(), start.elapsed()));
            }
            arrivals
        });

        assert_eq!(report.delivered, 3);
        assert_eq!(arrivals.len(), 3);
        for (position, at) in arrivals {
            // a body can only arrive after its request was issued
            let earliest = stagger * u32::try_from(position).unwrap();
            assert!(
                at >= earliest,
                "mirror {position} delivered after {at:?}, before its {earliest:?} delay"
            );
        }
    }

    #[test]
    fn test_client_identity_missing_files() {
        let dir = tempdir().unwrap();
        let config = NetConfig {
            identity: Some(ClientIdentity {
                cert: dir.path().join("client.crt"),
                key: dir.path().join("client.key"),
            }),
            ..NetConfig::default()
        };

        let error = NetClient::new(config).err().unwrap();
        match error {
            apkidx_errors::Error::Config(apkidx_errors::ConfigError::NotFound { path }) => {
                assert!(path.ends_with("client.crt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_identity_rejects_invalid_pem() {
        let dir = tempdir().unwrap();
        let cert = dir.path().join("client.crt");
        let key = dir.path().join("client.key");
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let config = NetConfig {
            identity: Some(ClientIdentity { cert, key }),
            ..NetConfig::default()
        };

        let error = NetClient::new(config).err().unwrap();
        assert!(matches!(
            error,
            apkidx_errors::Error::Network(apkidx_errors::NetworkError::TlsError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_missing_keys() {
        let server = MockServer::start();
        let listing = r#"<a href="../">../</a>
<a href="present.rsa.pub">present.rsa.pub</a>
<a href="new.rsa.pub">new.rsa.pub</a>"#;

        server.mock(|when, then| {
            when.method(GET).path("/keys/");
            then.status(200).body(listing);
        });
        let present = server.mock(|when, then| {
            when.method(GET).path("/keys/present.rsa.pub");
            then.status(200).body("should not be fetched");
        });
        let new_key = server.mock(|when, then| {
            when.method(GET).path("/keys/new.rsa.pub");
            then.status(200).body("-----BEGIN PUBLIC KEY-----\n");
        });

        let dir = tempdir().unwrap();
        let keys_dir = dir.path().join("keys");
        std::fs::create_dir_all(&keys_dir).unwrap();
        std::fs::write(keys_dir.join("present.rsa.pub"), "existing").unwrap();

        let client = NetClient::with_defaults().unwrap();
        let written = fetch_missing_keys(&client, &server.url("/keys/"), &keys_dir)
            .await
            .unwrap();

        present.assert_hits(0);
        new_key.assert();
        assert_eq!(written, vec![keys_dir.join("new.rsa.pub")]);
        assert_eq!(
            std::fs::read_to_string(keys_dir.join("present.rsa.pub")).unwrap(),
            "existing"
        );
    }

    #[tokio::test]
    async fn test_http_error_handling() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/404");
            then.status(404).body("Not Found");
        });

        let client = NetClient::with_defaults().unwrap();
        let error = fetch_text(&client, &server.url("/404")).await.unwrap_err();
        assert!(matches!(
            error,
            apkidx_errors::Error::Network(apkidx_errors::NetworkError::HttpError {
                status: 404,
                ..
            })
        ));
    }
}
