//! Smoke tests for the `sigwatch` binary.

use std::path::Path;
use std::process::{Command, Output};

use ed25519_dalek::{Signer, SigningKey};
use tempfile::TempDir;

fn sigwatch(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sigwatch"))
        .args(args)
        .current_dir(dir)
        .env_remove("SIGWATCH_HOME")
        .env_remove("SIGWATCH_CONFIG")
        .env_remove("SIGWATCH_TRUST_ANCHOR")
        .env_remove("SIGWATCH_INDEX_URL")
        .env_remove("SIGWATCH_MANIFEST_URL")
        .env_remove("SIGWATCH_ARTIFACT_URL")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run sigwatch")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Write an Ed25519 key and a manifest signed with it; return the paths as
/// strings for argument lists.
fn signed_fixture(dir: &Path, tamper: bool) -> (String, String, String) {
    let key = SigningKey::from_bytes(&[3u8; 32]);
    let manifest = "0000000000000000000000000000000000000000000000000000000000000000  app.bin\n";
    let sig = key.sign(manifest.as_bytes()).to_bytes();

    let key_path = dir.join("publisher.key");
    let manifest_path = dir.join("v1.txt");
    let sig_path = dir.join("v1.sig");
    std::fs::write(&key_path, key.verifying_key().to_bytes()).unwrap();
    let written = if tamper {
        manifest.replace("app.bin", "evil.bin")
    } else {
        manifest.to_string()
    };
    std::fs::write(&manifest_path, written).unwrap();
    std::fs::write(&sig_path, sig).unwrap();

    let s = |p: std::path::PathBuf| p.to_string_lossy().into_owned();
    (s(key_path), s(manifest_path), s(sig_path))
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    let out = sigwatch(dir.path(), &["--help"]);
    assert!(out.status.success());
    let text = stdout(&out);
    for cmd in ["run", "verify", "hash", "config"] {
        assert!(text.contains(cmd), "missing {cmd} in help:\n{text}");
    }
}

#[test]
fn version_flag_prints_version() {
    let dir = TempDir::new().unwrap();
    let out = sigwatch(dir.path(), &["--version"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_prints_effective_settings() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("snapshots");
    let root_arg = root.to_string_lossy().into_owned();
    let out = sigwatch(dir.path(), &["--root", &root_arg, "config"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("ecdsa-p256-sha256"));
    assert!(text.contains("versions.json"));
    assert!(text.contains("snapshots"));
}

#[test]
fn config_file_is_honoured() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("sigwatch.toml");
    std::fs::write(&file, "scheme = \"ed25519\"\ntimeout_secs = 5\n").unwrap();
    let file_arg = file.to_string_lossy().into_owned();
    let out = sigwatch(dir.path(), &["--config", &file_arg, "config"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("scheme = \"ed25519\""));
    assert!(text.contains("timeout_secs = 5"));
}

#[test]
fn hash_prints_both_digests() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("abc.txt"), b"abc").unwrap();
    let out = sigwatch(dir.path(), &["hash", "abc.txt"]);
    assert!(out.status.success());
    let text = stdout(&out);
    assert!(text.contains("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"));
    assert!(text.contains(
        "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
         2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
    ));
}

#[test]
fn hash_of_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let out = sigwatch(dir.path(), &["hash", "absent.bin"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn verify_accepts_genuine_manifest() {
    let dir = TempDir::new().unwrap();
    let (key, manifest, sig) = signed_fixture(dir.path(), false);
    let out = sigwatch(
        dir.path(),
        &["--trust-anchor", &key, "--scheme", "ed25519", "verify", &manifest, &sig],
    );
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.contains("app.bin"));
    assert!(text.contains("sha256"));
}

#[test]
fn verify_rejects_tampered_manifest() {
    let dir = TempDir::new().unwrap();
    let (key, manifest, sig) = signed_fixture(dir.path(), true);
    let out = sigwatch(
        dir.path(),
        &["--trust-anchor", &key, "--scheme", "ed25519", "verify", &manifest, &sig],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("SECURITY"));
    assert!(!stdout(&out).contains("evil.bin"));
}

#[test]
fn missing_trust_anchor_is_systemic() {
    let dir = TempDir::new().unwrap();
    let (_, manifest, sig) = signed_fixture(dir.path(), false);
    let out = sigwatch(
        dir.path(),
        &["--trust-anchor", "absent.pem", "verify", &manifest, &sig],
    );
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn unreachable_index_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let (key, _, _) = signed_fixture(dir.path(), false);
    let file = dir.path().join("sigwatch.toml");
    std::fs::write(
        &file,
        "index_url = \"http://127.0.0.1:9/versions.json\"\n\
         timeout_secs = 2\n\
         [retry]\n\
         max_attempts = 1\n",
    )
    .unwrap();
    let file_arg = file.to_string_lossy().into_owned();
    let root = dir.path().join("data").to_string_lossy().into_owned();
    let out = sigwatch(
        dir.path(),
        &[
            "--config", &file_arg, "--root", &root, "--trust-anchor", &key, "--scheme", "ed25519",
            "run",
        ],
    );
    assert_eq!(out.status.code(), Some(1));
}
