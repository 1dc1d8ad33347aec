//! End-to-end provisioning scenarios against counting fake collaborators.

#![allow(clippy::unwrap_used)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailsetup_core::identity::{
    ACCOUNT_TYPE, IdentityRegistration, RegistrarError, RegistrationReceipt,
};
use mailsetup_core::{
    AccountId, AccountRecord, AccountStore, ChannelSink, FailureReason, HostAuthFlags,
    IdentityRegistrar, Pipeline, Protocol, ProviderDirectory, ProviderTemplate,
    ProvisioningConfig, ProvisioningRequest, ReplyMode, Stage,
};
use serde_json::{Value, json};

#[derive(Default)]
struct CountingDirectory {
    lookups: AtomicUsize,
}

impl ProviderDirectory for CountingDirectory {
    fn lookup(&self, domain: &str) -> Option<ProviderTemplate> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        domain.eq_ignore_ascii_case("knownprovider.com").then(|| {
            ProviderTemplate::new(
                "known",
                "Known Provider",
                "knownprovider.com",
                "imap+ssl+://imap.$domain",
                "smtp+ssl+://smtp.$domain:2465",
            )
        })
    }
}

#[derive(Default)]
struct CountingStore {
    records: Mutex<Vec<AccountRecord>>,
}

impl CountingStore {
    fn writes(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl AccountStore for CountingStore {
    fn insert(
        &self,
        record: &AccountRecord,
    ) -> impl Future<Output = mailsetup_core::Result<Option<AccountId>>> + Send {
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        let id = AccountId::new(i64::try_from(records.len()).unwrap() * 100);
        std::future::ready(Ok(Some(id)))
    }
}

struct CountingRegistrar {
    delay: Duration,
    calls: AtomicUsize,
    emails: Mutex<Vec<String>>,
}

impl CountingRegistrar {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            emails: Mutex::new(Vec::new()),
        }
    }
}

impl IdentityRegistrar for CountingRegistrar {
    fn register(
        &self,
        registration: &IdentityRegistration,
    ) -> Result<RegistrationReceipt, RegistrarError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.emails
            .lock()
            .unwrap()
            .push(registration.email.clone());
        std::thread::sleep(self.delay);
        Ok(RegistrationReceipt {
            account_name: Some(registration.email.clone()),
            account_type: Some(ACCOUNT_TYPE.to_string()),
        })
    }
}

struct Harness {
    directory: Arc<CountingDirectory>,
    store: Arc<CountingStore>,
    registrar: Arc<CountingRegistrar>,
    pipeline: Pipeline<Arc<CountingStore>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_registrar(CountingRegistrar::new(Duration::ZERO), ProvisioningConfig::default())
    }

    fn with_registrar(registrar: CountingRegistrar, config: ProvisioningConfig) -> Self {
        let directory = Arc::new(CountingDirectory::default());
        let store = Arc::new(CountingStore::default());
        let registrar = Arc::new(registrar);
        let pipeline = Pipeline::new(
            config,
            directory.clone(),
            store.clone(),
            registrar.clone(),
        );
        Self {
            directory,
            store,
            registrar,
            pipeline,
        }
    }

    fn lookups(&self) -> usize {
        self.directory.lookups.load(Ordering::SeqCst)
    }

    fn record(&self, index: usize) -> AccountRecord {
        self.store.records.lock().unwrap()[index].clone()
    }
}

fn request(options: &Value) -> ProvisioningRequest {
    ProvisioningRequest::from_options(options.as_object().unwrap())
}

fn explicit(version: &str, email: &str) -> ProvisioningRequest {
    request(&json!({
        "version": version,
        "email": email,
        "password": "pw",
        "inServer": "mail.corp.example",
        "inPort": 993,
        "inSecurity": "ssl",
        "outServer": "smtp.corp.example",
        "outPort": "587",
        "outSecurity": "starttls",
    }))
}

#[tokio::test]
async fn scenario_a_known_provider_succeeds() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(request(&json!({
            "version": "1.0",
            "email": "user@knownprovider.com",
            "password": "pw",
        })))
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.account_id, Some(AccountId::new(100)));
    assert_eq!(harness.store.writes(), 1);

    let record = harness.record(0);
    assert_eq!(record.email, "user@knownprovider.com");
    assert_eq!(record.incoming.protocol, Protocol::Imap);
    assert_eq!(record.incoming.host, "imap.knownprovider.com");
    assert_eq!(record.incoming.port, 993);
    assert_eq!(record.incoming.login, "user@knownprovider.com");
    assert_eq!(record.outgoing.protocol, Protocol::Smtp);
    assert_eq!(record.outgoing.host, "smtp.knownprovider.com");
    assert_eq!(record.outgoing.port, 2465);
    assert_eq!(record.outgoing.login, "user@knownprovider.com");
    assert_eq!(harness.registrar.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_b_unknown_domain_is_invalid_host() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", "user@unknown.tld", "pw"))
        .await;

    assert!(!result.success);
    assert_eq!(result.reason, Some(FailureReason::InvalidHost));
    assert_eq!(harness.lookups(), 1);
    assert_eq!(harness.store.writes(), 0);
    assert_eq!(harness.registrar.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scenario_c_version_gate_runs_first() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(explicit("2.0", "user@knownprovider.com"))
        .await;

    assert_eq!(
        result.reason,
        Some(FailureReason::UnsupportedProtocolVersion)
    );
    assert_eq!(result.failed_stage, Some(Stage::Validating));
    assert_eq!(result.version, "2.0");
    assert_eq!(harness.lookups(), 0);
    assert_eq!(harness.store.writes(), 0);
}

#[tokio::test]
async fn scenario_d_slow_registrar_keeps_account() {
    let config = ProvisioningConfig::default().with_registrar_timeout(Duration::from_millis(100));
    let harness =
        Harness::with_registrar(CountingRegistrar::new(Duration::from_millis(800)), config);

    let result = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", "user@knownprovider.com", "pw"))
        .await;

    assert!(!result.success);
    assert_eq!(result.reason, Some(FailureReason::Unknown));
    assert_eq!(result.failed_stage, Some(Stage::RegisteringIdentity));
    assert_eq!(result.account_id, Some(AccountId::new(100)));
    assert_eq!(harness.store.writes(), 1);
}

#[tokio::test]
async fn missing_version_is_unsupported() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(request(&json!({"email": "user@knownprovider.com", "password": "pw"})))
        .await;

    assert_eq!(
        result.reason,
        Some(FailureReason::UnsupportedProtocolVersion)
    );
    assert_eq!(result.version, "0");
}

#[tokio::test]
async fn missing_fields_checked_before_syntax() {
    let harness = Harness::new();
    for options in [
        json!({"version": "1.0", "password": "pw"}),
        json!({"version": "1.0", "email": "not an address"}),
        json!({"version": "1.0", "email": "", "password": "pw"}),
        json!({"version": "1.0", "email": 42, "password": "pw"}),
    ] {
        let result = harness.pipeline.run(request(&options)).await;
        assert_eq!(
            result.reason,
            Some(FailureReason::MissingRequiredField),
            "{options}"
        );
    }
    assert_eq!(harness.lookups(), 0);
    assert_eq!(harness.store.writes(), 0);
}

#[tokio::test]
async fn malformed_address_rejected() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", "user.knownprovider.com", "pw"))
        .await;
    assert_eq!(result.reason, Some(FailureReason::MalformedAddress));
    assert_eq!(harness.lookups(), 0);
}

#[tokio::test]
async fn explicit_descriptors_used_verbatim() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(explicit("1.0", "user@unknown.tld"))
        .await;

    assert!(result.success, "{result:?}");
    let record = harness.record(0);
    assert_eq!(record.incoming.protocol, Protocol::Imap);
    assert_eq!(record.incoming.host, "mail.corp.example");
    assert_eq!(record.incoming.port, 993);
    assert_eq!(record.incoming.login, "user@unknown.tld");
    assert_eq!(record.incoming.flags, HostAuthFlags::PROVISIONING_DEFAULT);
    assert_eq!(record.outgoing.protocol, Protocol::Smtp);
    assert_eq!(record.outgoing.host, "smtp.corp.example");
    assert_eq!(record.outgoing.port, 587);
    assert_eq!(record.outgoing.login, "user@unknown.tld");
    assert_eq!(record.outgoing.flags, HostAuthFlags::PROVISIONING_DEFAULT);
}

#[tokio::test]
async fn padded_email_is_normalized_everywhere() {
    let harness = Harness::new();
    let result = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", " user@knownprovider.com ", "pw"))
        .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.email, "user@knownprovider.com");

    let record = harness.record(0);
    assert_eq!(record.email, "user@knownprovider.com");
    assert_eq!(record.display_name, "user@knownprovider.com");
    assert_eq!(record.incoming.login, "user@knownprovider.com");
    assert_eq!(record.outgoing.login, "user@knownprovider.com");
    assert_eq!(
        *harness.registrar.emails.lock().unwrap(),
        ["user@knownprovider.com"]
    );
}

#[tokio::test]
async fn same_request_twice_gets_two_ids() {
    let harness = Harness::new();
    let first = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", "user@knownprovider.com", "pw"))
        .await;
    let second = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", "user@knownprovider.com", "pw"))
        .await;

    assert!(first.success && second.success);
    assert_ne!(first.account_id, second.account_id);
    assert_eq!(harness.store.writes(), 2);
}

#[tokio::test]
async fn targeted_reply_skips_broadcast() {
    let harness = Harness::new();
    let mut broadcast = harness.pipeline.subscribe();
    let (sink, mut replies) = ChannelSink::new();

    let result = harness
        .pipeline
        .run(
            ProvisioningRequest::new("1.0", "user@knownprovider.com", "pw")
                .with_reply(ReplyMode::targeted(sink)),
        )
        .await;

    assert_eq!(replies.recv().await.unwrap(), result);
    assert!(replies.try_recv().is_err());
    assert!(broadcast.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_reply_reaches_listeners() {
    let harness = Harness::new();
    let mut listener = harness.pipeline.subscribe();

    let result = harness
        .pipeline
        .run(ProvisioningRequest::new("1.0", "user@unknown.tld", "pw"))
        .await;

    let received = listener.recv().await.unwrap();
    assert_eq!(received, result);
    let payload = serde_json::to_value(&received).unwrap();
    assert_eq!(payload["reasonCode"], "InvalidHost");
    assert_eq!(payload["email"], "user@unknown.tld");
}
