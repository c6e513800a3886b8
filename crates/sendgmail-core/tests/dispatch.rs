//! End-to-end command flows against fake collaborators.

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{Duration, Utc};
use sendgmail_core::{
    AuthFlow, AuthorizedSession, Command, Config, Credential, CredentialManager, CredentialStore,
    Error, Interaction, MailApi, Outcome, OutboundMessage, Profile, Receipt, Result, run,
};

const ADDRESS: &str = "me@gmail.com";

/// Event log shared by the fakes so ordering can be asserted.
type Log = Rc<RefCell<Vec<String>>>;

struct FakeAuth {
    log: Log,
    cache: PathBuf,
    deny: bool,
}

impl AuthFlow for FakeAuth {
    async fn authorize(&self) -> sendgmail_oauth::Result<Credential> {
        self.log
            .borrow_mut()
            .push(format!("authorize cache_exists={}", self.cache.exists()));
        if self.deny {
            return Err(sendgmail_oauth::Error::AccessDenied);
        }
        Ok(Credential::new("authorized")
            .with_refresh_token("1//new")
            .with_expiry(Utc::now() + Duration::hours(1)))
    }

    async fn refresh(&self, credential: &Credential) -> sendgmail_oauth::Result<Credential> {
        self.log.borrow_mut().push("refresh".to_string());
        let mut refreshed = credential.clone();
        refreshed.access_token = "refreshed".to_string();
        refreshed.expiry = Some(Utc::now() + Duration::hours(1));
        Ok(refreshed)
    }
}

struct FakeInteraction {
    log: Log,
    secret: PathBuf,
}

impl Interaction for FakeInteraction {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        self.log.borrow_mut().push(format!("confirm {message}"));
        fs::write(&self.secret, r#"{"installed":{"client_id":"id"}}"#)?;
        Ok(true)
    }
}

struct FakeMail {
    log: Log,
    sent: RefCell<Vec<String>>,
}

impl MailApi for FakeMail {
    async fn get_profile(&self, session: &AuthorizedSession) -> Result<Profile> {
        self.log
            .borrow_mut()
            .push(format!("get_profile {}", session.access_token()));
        Ok(Profile {
            email_address: ADDRESS.to_string(),
            messages_total: 0,
            threads_total: 0,
            history_id: None,
        })
    }

    async fn send_message(
        &self,
        _session: &AuthorizedSession,
        message: &OutboundMessage,
    ) -> Result<Receipt> {
        self.log.borrow_mut().push("send_message".to_string());
        self.sent.borrow_mut().push(message.raw().to_string());
        Ok(Receipt {
            id: "18c1".to_string(),
            thread_id: Some("18c1".to_string()),
            label_ids: vec!["SENT".to_string()],
        })
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    config: Config,
    log: Log,
    manager: CredentialManager<FakeAuth, FakeInteraction>,
    mail: FakeMail,
}

impl Harness {
    fn new() -> Self {
        Self::build(false)
    }

    /// A harness whose user declines the consent screen.
    fn denying() -> Self {
        Self::build(true)
    }

    fn build(deny: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("sendgmail"));
        let log: Log = Rc::default();
        let auth = FakeAuth {
            log: Rc::clone(&log),
            cache: config.credential_cache_path(),
            deny,
        };
        let interaction = FakeInteraction {
            log: Rc::clone(&log),
            secret: config.client_secret_path(),
        };
        let manager = CredentialManager::new(config.clone(), auth, interaction);
        let mail = FakeMail {
            log: Rc::clone(&log),
            sent: RefCell::default(),
        };
        Self {
            _dir: dir,
            config,
            log,
            manager,
            mail,
        }
    }

    fn store(&self) -> CredentialStore {
        CredentialStore::from_config(&self.config)
    }

    fn with_secret(self) -> Self {
        fs::create_dir_all(self.config.config_dir()).unwrap();
        fs::write(self.config.client_secret_path(), "{}").unwrap();
        self
    }

    fn with_cached(self, credential: &Credential) -> Self {
        self.store().save(credential).unwrap();
        self
    }

    async fn run(&mut self, command: Command) -> (Result<Outcome>, String) {
        let mut out = Vec::new();
        let result = run(command, &mut self.manager, &self.mail, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

fn valid() -> Credential {
    Credential::new("cached")
        .with_refresh_token("1//old")
        .with_expiry(Utc::now() + Duration::hours(1))
}

fn expired() -> Credential {
    Credential::new("stale")
        .with_refresh_token("1//old")
        .with_expiry(Utc::now() - Duration::minutes(10))
}

#[tokio::test]
async fn whoami_makes_one_profile_call_and_no_sends() {
    let mut h = Harness::new().with_cached(&valid());

    let (result, out) = h.run(Command::WhoAmI).await;

    assert_eq!(
        result.unwrap(),
        Outcome::Reported {
            email: ADDRESS.to_string()
        }
    );
    assert_eq!(out, "The current registered email address is: me@gmail.com\n");
    assert_eq!(h.events(), vec!["get_profile cached"]);
    assert!(h.mail.sent.borrow().is_empty());
}

#[tokio::test]
async fn send_posts_the_built_message_once() {
    let mut h = Harness::new().with_cached(&valid());

    let (result, out) = h
        .run(Command::from_flags(
            Some("Hi".to_string()),
            Some("a@b.com".to_string()),
            Some("body text".to_string()),
            false,
            false,
        ))
        .await;

    assert!(matches!(result.unwrap(), Outcome::Sent { ref to, .. } if to == "a@b.com"));
    assert_eq!(out, "Email sent to a@b.com using the email address me@gmail.com\n");

    let expected = OutboundMessage::build("a@b.com", "Hi", "body text").unwrap();
    assert_eq!(*h.mail.sent.borrow(), vec![expected.encoded().to_string()]);
    assert_eq!(h.events(), vec!["get_profile cached", "send_message"]);
}

#[tokio::test]
async fn missing_arguments_do_not_touch_credentials() {
    let mut h = Harness::new();

    let (result, out) = h
        .run(Command::from_flags(
            Some("Hi".to_string()),
            None,
            Some("body".to_string()),
            false,
            false,
        ))
        .await;

    assert_eq!(result.unwrap(), Outcome::Incomplete);
    assert_eq!(
        out,
        "Please make sure subject, recipient and message are included\n"
    );
    assert!(h.events().is_empty());
    assert!(!h.config.config_dir().exists());
}

#[tokio::test]
async fn newprofile_deletes_before_authorizing() {
    let mut h = Harness::new().with_secret().with_cached(&valid());

    let (result, out) = h.run(Command::NewProfile).await;

    assert!(result.is_ok());
    assert_eq!(
        out,
        "Old token deleted\nThe current registered email address is: me@gmail.com\n"
    );
    assert_eq!(
        h.events(),
        vec!["authorize cache_exists=false", "get_profile authorized"]
    );
    assert_eq!(h.store().load().unwrap().unwrap().access_token, "authorized");
}

#[tokio::test]
async fn newprofile_reports_deletion_even_if_authorization_fails() {
    let mut h = Harness::denying().with_secret().with_cached(&valid());

    let (result, out) = h.run(Command::NewProfile).await;

    assert!(matches!(result, Err(Error::Authorization(_))));
    assert_eq!(out, "Old token deleted\n");
    assert_eq!(h.events(), vec!["authorize cache_exists=false"]);
    assert!(!h.store().exists());
}

#[tokio::test]
async fn newprofile_without_cache_reports_nothing_deleted() {
    let mut h = Harness::new().with_secret();

    let (_, out) = h.run(Command::NewProfile).await;

    assert!(out.starts_with("No token to delete\n"));
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_saved() {
    let mut h = Harness::new().with_secret().with_cached(&expired());

    let (result, _) = h.run(Command::WhoAmI).await;

    assert!(result.is_ok());
    assert_eq!(h.events(), vec!["refresh", "get_profile refreshed"]);
    let stored = h.store().load().unwrap().unwrap();
    assert_eq!(stored.access_token, "refreshed");
    assert_eq!(stored.refresh_token.as_deref(), Some("1//old"));
    assert!(stored.expiry.unwrap() > Utc::now());
}

#[cfg(unix)]
#[tokio::test]
async fn valid_credential_is_not_rewritten() {
    use std::os::unix::fs::MetadataExt;

    let mut h = Harness::new().with_cached(&valid());
    let cache = h.config.credential_cache_path();
    let before = fs::metadata(&cache).unwrap();

    h.run(Command::WhoAmI).await.0.unwrap();
    h.run(Command::WhoAmI).await.0.unwrap();

    let after = fs::metadata(&cache).unwrap();
    assert_eq!(after.ino(), before.ino());
    assert_eq!(after.mtime_nsec(), before.mtime_nsec());
}

#[cfg(unix)]
#[tokio::test]
async fn refreshed_credential_replaces_the_cache_file() {
    use std::os::unix::fs::MetadataExt;

    let mut h = Harness::new().with_secret().with_cached(&expired());
    let cache = h.config.credential_cache_path();
    let before = fs::metadata(&cache).unwrap().ino();

    h.run(Command::WhoAmI).await.0.unwrap();

    assert_ne!(fs::metadata(&cache).unwrap().ino(), before);
    assert!(!cache.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn first_run_prompts_for_client_secret_before_authorizing() {
    let mut h = Harness::new();

    let (result, _) = h.run(Command::WhoAmI).await;

    assert!(result.is_ok());
    let events = h.events();
    assert_eq!(events.len(), 3);
    let dir = h.config.config_dir().display().to_string();
    assert_eq!(
        events[0],
        format!("confirm Place credentials.json in the following folder:\n{dir}")
    );
    assert_eq!(events[1], "authorize cache_exists=false");
    assert_eq!(events[2], "get_profile authorized");
    assert!(h.store().load().unwrap().unwrap().expiry.unwrap() > Utc::now());
}

#[tokio::test]
async fn corrupt_cache_is_replaced() {
    let mut h = Harness::new().with_secret();
    fs::write(h.config.credential_cache_path(), [0x80, 0x04, 0x95]).unwrap();

    let (result, _) = h.run(Command::WhoAmI).await;

    assert!(result.is_ok());
    assert_eq!(h.store().load().unwrap().unwrap().access_token, "authorized");
}

#[tokio::test]
async fn header_injection_is_rejected_without_sending() {
    let mut h = Harness::new().with_cached(&valid());

    let (result, out) = h
        .run(Command::Send {
            to: "a@b.com\nBcc: x@y.com".to_string(),
            subject: "Hi".to_string(),
            body: "x".to_string(),
        })
        .await;

    assert!(matches!(result, Err(Error::Mime(_))));
    assert!(out.is_empty());
    assert!(h.mail.sent.borrow().is_empty());
}
