//! Shared descriptor fixtures for unit tests

use crate::descriptor::{
    BuildDescriptor, BuildType, CompileOptions, DependencyDeclaration, SdkBounds,
};
use std::collections::BTreeMap;

/// TOML rendition of the reference application module
pub const HERBAL_TOML: &str = r#"
plugins = ["com.android.application", "kotlin-android", "com.google.gms.google-services"]

[android]
compileSdk = 35
ndkVersion = "27.0.12077973"

[android.defaultConfig]
applicationId = "com.example.herbal_i"
minSdk = 26
targetSdk = 35
versionCode = 1
versionName = "1.0.0"
abiFilters = ["armeabi-v7a", "arm64-v8a", "x86_64"]

[android.compileOptions]
sourceCompatibility = "11"
targetCompatibility = "11"

[android.kotlinOptions]
jvmTarget = "11"

[android.packaging]
noCompress = ["tflite", "lite"]

[android.buildTypes.release]
signingConfig = "debug"

[[dependencies]]
coordinate = "com.google.firebase:firebase-bom:32.7.4"
platform = true

[[dependencies]]
coordinate = "com.google.firebase:firebase-auth"
"#;

/// The reference application module as a Gradle build file
pub const HERBAL_GRADLE: &str = r#"
apply plugin: 'com.android.application'
apply plugin: 'kotlin-android'
apply plugin: 'com.google.gms.google-services'
apply from: "$flutterRoot/packages/flutter_tools/gradle/flutter.gradle"

android {
    compileSdkVersion 35
    ndkVersion "27.0.12077973"

    defaultConfig {
        applicationId "com.example.herbal_i"
        minSdkVersion 26
        targetSdkVersion 35
        versionCode 1
        versionName "1.0.0"
        ndk {
            abiFilters 'armeabi-v7a', 'arm64-v8a', 'x86_64'
        }
    }

    compileOptions {
        sourceCompatibility JavaVersion.VERSION_11
                targetCompatibility JavaVersion.VERSION_11
    }

    kotlinOptions {
        jvmTarget = '11'
    }

    aaptOptions {
        noCompress 'tflite'
        noCompress 'lite'
    }

    buildTypes {
        release {
            signingConfig signingConfigs.debug
        }
    }
}

dependencies {
    implementation "org.jetbrains.kotlin:kotlin-stdlib:1.9.10"
    implementation platform("com.google.firebase:firebase-bom:32.7.4")
    implementation 'com.google.firebase:firebase-auth'
    implementation 'com.google.firebase:firebase-database'

    implementation 'org.tensorflow:tensorflow-lite:2.14.0'
    implementation 'org.tensorflow:tensorflow-lite-support:0.4.4'
    implementation 'org.tensorflow:tensorflow-lite-metadata:0.4.4'
}
"#;

/// A valid descriptor built in code, with the given SDK bounds and ABIs
pub fn descriptor(min_sdk: u32, target_sdk: u32, compile_sdk: u32, abis: &[&str]) -> BuildDescriptor {
    let mut build_types = BTreeMap::new();
    build_types.insert(
        "release".to_string(),
        BuildType {
            signing_config: Some("debug".to_string()),
            minify_enabled: false,
        },
    );

    BuildDescriptor {
        application_id: "com.example.herbal_i".to_string(),
        version_code: 1,
        version_name: "1.0.0".to_string(),
        sdk: SdkBounds {
            min_sdk,
            target_sdk,
            compile_sdk,
        },
        ndk_version: None,
        abi_filters: abis.iter().map(ToString::to_string).collect(),
        compile_options: CompileOptions::default(),
        plugins: vec!["com.android.application".to_string()],
        no_compress: Vec::new(),
        build_types,
        dependencies: Vec::new(),
    }
}

/// [`descriptor`] with the given dependency declarations
pub fn with_dependencies(dependencies: Vec<DependencyDeclaration>) -> BuildDescriptor {
    BuildDescriptor {
        dependencies,
        ..descriptor(26, 35, 35, &["arm64-v8a"])
    }
}
