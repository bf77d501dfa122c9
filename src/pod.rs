// Small constructors shared by the Deployment and Job builders.

use k8s_openapi::api::core::v1::{
    ConfigMapKeySelector, ConfigMapVolumeSource, EmptyDirVolumeSource, EnvVar, EnvVarSource, Pod,
    SecretKeySelector, Volume, VolumeMount,
};
use std::collections::BTreeMap;

pub const READ_MODE: i32 = 0o444;
pub const EXEC_MODE: i32 = 0o555;

/// Labels selecting the pods of the ironic instance `name`.
pub fn ironic_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (crate::LABEL_APP.to_string(), "ironic".to_string()),
        (crate::LABEL_IRONIC_CR.to_string(), name.to_string()),
    ])
}

pub fn control_plane_selector() -> BTreeMap<String, String> {
    BTreeMap::from([(
        crate::NODE_SELECTOR_CONTROL_PLANE.to_string(),
        "enabled".to_string(),
    )])
}

/// Names of the given pods, skipping any without one.
pub fn pod_names(pods: &[Pod]) -> Vec<String> {
    pods.iter()
        .filter_map(|pod| pod.metadata.name.clone())
        .collect()
}

pub fn config_map_env(name: &str, config_map: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            config_map_key_ref: Some(ConfigMapKeySelector {
                name: Some(config_map.to_string()),
                key: key.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn secret_env(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret.to_string()),
                key: key.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn config_map_volume(name: &str, config_map: &str, mode: i32) -> Volume {
    Volume {
        name: name.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(config_map.to_string()),
            default_mode: Some(mode),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn empty_dir_volume(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    }
}

pub fn mount(name: &str, path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        ..Default::default()
    }
}

/// Read-only mount of the single key `sub_path` of volume `name`.
pub fn file_mount(name: &str, path: &str, sub_path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        sub_path: Some(sub_path.to_string()),
        read_only: Some(true),
        ..Default::default()
    }
}
