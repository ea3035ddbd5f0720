//! Unit tests for session toggles.

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create key file");
    file.write_all(&vec![b'k'; len]).expect("write key");
    file
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

#[fixture]
fn release_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn release_vars(key: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path().to_string_lossy().into_owned()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

#[rstest]
fn release_accepts_complete_configuration(release_key: NamedTempFile) {
    let env = mock_env(release_vars(&release_key));

    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(
        settings.key_fingerprint(),
        key_fingerprint(&Key::derive_from(&[b'k'; SESSION_KEY_MIN_LEN]))
    );
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_rejects_missing_toggles(release_key: NamedTempFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&release_key);
    vars.remove(missing);

    let result = session_settings_from_env(&mock_env(vars), BuildMode::Release);

    assert!(matches!(
        result,
        Err(SessionConfigError::MissingEnv { name }) if name == missing
    ));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "sometimes")]
#[case(SAMESITE_ENV, "Loose")]
#[case(ALLOW_EPHEMERAL_ENV, "maybe")]
fn release_rejects_malformed_toggles(
    release_key: NamedTempFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&release_key);
    vars.insert(name, value.to_owned());

    let result = session_settings_from_env(&mock_env(vars), BuildMode::Release);

    assert!(matches!(
        result,
        Err(SessionConfigError::InvalidEnv { name: rejected, .. }) if rejected == name
    ));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = key_file(SESSION_KEY_MIN_LEN - 1);
    let env = mock_env(release_vars(&short));

    let result = session_settings_from_env(&env, BuildMode::Release);

    assert!(matches!(
        result,
        Err(SessionConfigError::KeyTooShort { length, .. }) if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    let result = session_settings_from_env(&mock_env(vars), BuildMode::Release);

    assert!(matches!(result, Err(SessionConfigError::EphemeralNotAllowed)));
}

#[rstest]
fn release_rejects_same_site_none_without_secure(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    let result = session_settings_from_env(&mock_env(vars), BuildMode::Release);

    assert!(matches!(result, Err(SessionConfigError::InsecureSameSiteNone)));
}

#[rstest]
fn release_requires_a_readable_key() {
    let vars = HashMap::from([
        (KEY_FILE_ENV, "/nonexistent/lifelink/session_key".to_owned()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Lax".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);

    let result = session_settings_from_env(&mock_env(vars), BuildMode::Release);

    assert!(matches!(result, Err(SessionConfigError::KeyRead { .. })));
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let vars = HashMap::from([(KEY_FILE_ENV, "/nonexistent/lifelink/session_key".to_owned())]);

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_tolerates_malformed_values_and_short_keys() {
    let short = key_file(8);
    let vars = HashMap::from([
        (KEY_FILE_ENV, short.path().to_string_lossy().into_owned()),
        (COOKIE_SECURE_ENV, "often".to_owned()),
        (SAMESITE_ENV, "None".to_owned()),
    ]);

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug tolerance");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::None);
}

#[rstest]
fn debug_replaces_keys_too_short_to_derive() {
    let short = key_file(SESSION_KEY_DERIVE_MIN_LEN - 1);
    let vars = HashMap::from([(KEY_FILE_ENV, short.path().to_string_lossy().into_owned())]);
    let env = mock_env(vars);

    let first = session_settings_from_env(&env, BuildMode::Debug).expect("temporary key");
    let second = session_settings_from_env(&env, BuildMode::Debug).expect("temporary key");

    assert_ne!(first.key_fingerprint(), second.key_fingerprint());
}

#[rstest]
fn debug_derives_keys_below_the_release_minimum() {
    let short = key_file(SESSION_KEY_DERIVE_MIN_LEN);
    let vars = HashMap::from([(KEY_FILE_ENV, short.path().to_string_lossy().into_owned())]);

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("derived key");

    assert_eq!(
        settings.key_fingerprint(),
        key_fingerprint(&Key::derive_from(&[b'k'; SESSION_KEY_DERIVE_MIN_LEN]))
    );
}

#[rstest]
#[case("1", Some(true))]
#[case(" Yes ", Some(true))]
#[case("n", Some(false))]
#[case("FALSE", Some(false))]
#[case("2", None)]
fn booleans_accept_common_spellings(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}

#[rstest]
fn fingerprints_distinguish_keys() {
    let first = key_fingerprint(&Key::derive_from(&[b'a'; 64]));
    let second = key_fingerprint(&Key::derive_from(&[b'b'; 64]));

    assert_eq!(first.len(), FINGERPRINT_BYTES * 2);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_ne!(first, second);
    assert_eq!(first, key_fingerprint(&Key::derive_from(&[b'a'; 64])));
}
