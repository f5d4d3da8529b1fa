use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey};
use playforce::{ClientConfig, Session, SessionConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_PRIVATE_KEY: &[u8] =
    include_bytes!("../../crates/sf-license/tests/fixtures/test_signing_key.pem");
const TEST_PUBLIC_KEY: &[u8] =
    include_bytes!("../../crates/sf-license/tests/fixtures/test_signing_key.pub.pem");

pub const QUERY_PATH: &str = "/services/data/v57.0/query/";

pub struct Harness {
    pub server: MockServer,
    pub dir: TempDir,
    pub session: Session,
}

impl Harness {
    /// A session whose config directory holds the given profiles. Every
    /// profile logs in against the mock server.
    pub async fn new(profiles: &[(&str, Value)]) -> Self {
        Self::with_client_config(profiles, ClientConfig::default()).await
    }

    /// Like [`Harness::new`], with custom transport settings.
    pub async fn with_client_config(profiles: &[(&str, Value)], client: ClientConfig) -> Self {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let configs = dir.path().join("configs");
        std::fs::create_dir(&configs).unwrap();

        for (name, fields) in profiles {
            let mut record = json!({ "login_url": server.uri(), "client_id": "test-client" });
            for (key, value) in fields.as_object().unwrap() {
                record[key] = value.clone();
            }
            std::fs::write(configs.join(format!("{name}.json")), record.to_string()).unwrap();
        }

        let port = free_port();
        let config = SessionConfig::default()
            .with_config_dir(&configs)
            .with_license_file(dir.path().join(".env"))
            .with_callback_ports(port..=port)
            .with_client_config(client)
            .with_license_public_key(TEST_PUBLIC_KEY);
        let session = Session::create(config).unwrap();

        Self {
            server,
            dir,
            session,
        }
    }

    /// A session with one client-credentials profile, already selected.
    pub async fn client_credentials() -> Self {
        let harness = Self::new(&[("dev", json!({ "client_secret": "s3cret" }))]).await;
        assert!(harness.session.select_config("dev"));
        harness
    }

    pub fn write_license(&self, data: &Value) {
        std::fs::write(
            self.dir.path().join(".env"),
            format!("PLAYFORCE_LICENSE={}\n", license_token(data)),
        )
        .unwrap();
    }
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn mount_token(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "instance_url": server.uri(),
            "token_type": "Bearer",
            "issued_at": "1700000000000"
        })))
        .mount(server)
        .await;
}

pub fn page(total: u64, ids: &[&str], next: Option<&str>) -> Value {
    let records: Vec<_> = ids.iter().map(|id| json!({ "Id": id })).collect();
    let mut body = json!({ "totalSize": total, "done": next.is_none(), "records": records });
    if let Some(next) = next {
        body["nextRecordsUrl"] = json!(next);
    }
    body
}

pub fn active_license() -> Value {
    json!({
        "organization": "Acme Corp",
        "licenseeEmail": "admin@acme.test",
        "tier": "pro",
        "startDateUTC": "2020-01-01T00:00:00Z",
        "paidEndDateUTC": "2099-12-31T23:59:59Z"
    })
}

pub fn license_token(data: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY).unwrap();
    let message = serde_json::to_string(data).unwrap();
    let signature = jsonwebtoken::crypto::sign(message.as_bytes(), &key, Algorithm::RS256).unwrap();
    let signature = STANDARD.encode(URL_SAFE_NO_PAD.decode(signature).unwrap());
    STANDARD.encode(json!({ "data": data, "signature": signature }).to_string())
}
