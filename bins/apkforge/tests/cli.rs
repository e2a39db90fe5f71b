use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const DESCRIPTOR: &str = r#"
plugins = ["com.android.application"]

[android]
compileSdk = 35

[android.defaultConfig]
applicationId = "com.example.herbal_i"
minSdk = 26
targetSdk = 35
abiFilters = ["arm64-v8a", "armeabi-v7a", "x86_64"]

[android.packaging]
noCompress = ["tflite", "lite"]

[[dependencies]]
coordinate = "com.google.firebase:firebase-bom:32.7.4"
platform = true

[[dependencies]]
coordinate = "com.google.firebase:firebase-auth"

[[dependencies]]
coordinate = "org.tensorflow:tensorflow-lite:2.14.0"
"#;

const GRADLE: &str = r#"
apply plugin: 'com.android.application'

android {
    compileSdkVersion 35
    defaultConfig {
        applicationId "com.example.herbal_i"
        minSdkVersion 26
        targetSdkVersion 35
        ndk {
            abiFilters 'arm64-v8a'
        }
    }
}

dependencies {
    implementation 'org.tensorflow:tensorflow-lite:2.14.0'
}
"#;

#[allow(deprecated)]
fn apkforge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("apkforge").unwrap();
    cmd.current_dir(dir.path()).arg("--no-color").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn resolve_prints_json() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(&dir, "build.toml", DESCRIPTOR);

    apkforge(&dir)
        .args(["resolve", "--json"])
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"arm64-v8a\""))
        .stdout(predicate::str::contains("\"32.7.4\""));
}

#[test]
fn validate_accepts_reference_bounds() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(&dir, "build.toml", DESCRIPTOR);

    apkforge(&dir)
        .arg("validate")
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.herbal_i"));
}

#[test]
fn constraint_violation_exits_3() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(&dir, "build.toml", &DESCRIPTOR.replace("minSdk = 26", "minSdk = 36"));

    apkforge(&dir)
        .arg("validate")
        .arg(&descriptor)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("minSdk<=targetSdk"));
}

#[test]
fn malformed_descriptor_exits_2() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(&dir, "build.toml", &DESCRIPTOR.replace("minSdk = 26", "minSdk = \"soon\""));

    apkforge(&dir)
        .arg("resolve")
        .arg(&descriptor)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("android.defaultConfig.minSdk"));
}

#[test]
fn version_conflict_exits_4() {
    let dir = TempDir::new().unwrap();
    let conflicting = format!(
        "{}\n[[dependencies]]\ncoordinate = \"org.tensorflow:tensorflow-lite:2.16.1\"\n",
        DESCRIPTOR
    );
    let descriptor = write(&dir, "build.toml", &conflicting);

    apkforge(&dir)
        .arg("deps")
        .arg(&descriptor)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("org.tensorflow:tensorflow-lite"));
}

#[test]
fn missing_descriptor_exits_1() {
    let dir = TempDir::new().unwrap();

    apkforge(&dir)
        .args(["resolve", "absent.toml"])
        .assert()
        .code(1);
}

#[test]
fn packaging_lists_uncompressed_assets() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(&dir, "build.toml", DESCRIPTOR);
    let assets = dir.path().join("assets");
    std::fs::create_dir_all(assets.join("models")).unwrap();
    std::fs::write(assets.join("models/plant.tflite"), b"").unwrap();
    std::fs::write(assets.join("labels.txt"), b"").unwrap();

    apkforge(&dir)
        .args(["packaging", "--json", "--assets"])
        .arg(&assets)
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::contains("models/plant.tflite"))
        .stdout(predicate::str::contains("labels.txt").not());
}

#[test]
fn catalog_from_config_file() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(
        &dir,
        "build.toml",
        &format!("{}\n[[dependencies]]\ncoordinate = \"androidx.core:core-ktx\"\n", DESCRIPTOR),
    );
    write(
        &dir,
        "libs.versions.toml",
        "[libraries]\ncore-ktx = { module = \"androidx.core:core-ktx\", version = \"1.13.1\" }\n",
    );
    write(&dir, "apkforge.toml", "[dependencies]\ncatalog = \"libs.versions.toml\"\n");

    apkforge(&dir)
        .args(["deps", "--json"])
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::contains("1.13.1"));
}

#[test]
fn import_then_resolve() {
    let dir = TempDir::new().unwrap();
    let gradle = write(&dir, "build.gradle", GRADLE);
    let output = dir.path().join("imported.toml");

    apkforge(&dir)
        .arg("import")
        .arg(&gradle)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    apkforge(&dir)
        .args(["resolve", "--json"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("2.14.0"));
}

#[test]
fn format_flag_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let descriptor = write(&dir, "module.txt", GRADLE);

    apkforge(&dir)
        .args(["--format", "gradle", "validate"])
        .arg(&descriptor)
        .assert()
        .success();
}

#[test]
fn abis_lists_enumeration() {
    let dir = TempDir::new().unwrap();

    apkforge(&dir)
        .args(["abis", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("armeabi-v7a"))
        .stdout(predicate::str::contains("x86_64"));
}
