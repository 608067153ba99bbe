//! Resource assembly for the emitting process.
//!
//! The resource is built once per pipeline and attached to every exported
//! signal. Detected attributes merge last-writer-wins in a fixed order:
//! environment, host, telemetry SDK self-description, custom detectors,
//! then explicit attributes, so explicit configuration always wins.

use crate::config::PipelineConfig;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::resource::{
    EnvResourceDetector, ResourceDetector, TelemetryResourceDetector,
};
use opentelemetry_semantic_conventions::resource::{HOST_NAME, OS_TYPE};
use std::env;
use std::fs;

pub(crate) fn build_resource(config: &mut PipelineConfig) -> Resource {
    if let Some(resource) = config.resource_override.take() {
        if !config.resource_attributes.is_empty() {
            tracing::warn!(
                discarded = ?config.resource_attributes,
                "resource override discards configured resource attributes"
            );
        }
        if !config.resource_detectors.is_empty() {
            tracing::warn!(
                discarded = config.resource_detectors.len(),
                "resource override discards configured resource detectors"
            );
        }
        return resource;
    }

    let mut builder = Resource::builder_empty()
        .with_detector(Box::new(EnvResourceDetector::new()))
        .with_detector(Box::new(HostResourceDetector))
        .with_detector(Box::new(TelemetryResourceDetector))
        .with_detectors(&std::mem::take(&mut config.resource_detectors))
        .with_attributes(std::mem::take(&mut config.resource_attributes));

    if let Some(name) = config.service_name.take() {
        builder = builder.with_service_name(name);
    }

    builder.build()
}

/// Detects `host.name` and `os.type` of the machine running the process.
///
/// The hostname comes from the `HOSTNAME` environment variable, falling
/// back to `/etc/hostname`; if neither yields a value the attribute is
/// omitted rather than failing detection.
#[derive(Debug, Default)]
pub struct HostResourceDetector;

impl ResourceDetector for HostResourceDetector {
    fn detect(&self) -> Resource {
        let mut attributes = vec![KeyValue::new(OS_TYPE, env::consts::OS)];

        if let Some(hostname) = hostname() {
            attributes.push(KeyValue::new(HOST_NAME, hostname));
        }

        Resource::builder_empty().with_attributes(attributes).build()
    }
}

fn hostname() -> Option<String> {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Key;

    #[test]
    fn override_wins_over_attributes_and_detectors() {
        let explicit = Resource::builder_empty()
            .with_attributes([KeyValue::new("service.name", "pinned")])
            .build();

        let mut config = PipelineConfig {
            resource_override: Some(explicit.clone()),
            resource_attributes: vec![KeyValue::new("ignored", "yes")],
            resource_detectors: vec![Box::new(HostResourceDetector)],
            ..PipelineConfig::default()
        };

        let built = build_resource(&mut config);

        assert_eq!(built, explicit);
        assert!(built.get(&Key::new("ignored")).is_none());
    }

    #[test]
    fn explicit_attributes_override_detected_values() {
        let mut config = PipelineConfig {
            resource_attributes: vec![KeyValue::new(OS_TYPE, "mainframe")],
            ..PipelineConfig::default()
        };

        let built = build_resource(&mut config);

        assert_eq!(
            built.get(&Key::new(OS_TYPE)).map(|v| v.to_string()),
            Some("mainframe".to_owned())
        );
    }

    #[test]
    fn service_name_setting_is_applied() {
        let mut config = PipelineConfig {
            service_name: Some("resource-test".to_owned()),
            ..PipelineConfig::default()
        };

        let built = build_resource(&mut config);

        assert_eq!(
            built.get(&Key::new("service.name")).map(|v| v.to_string()),
            Some("resource-test".to_owned())
        );
    }

    #[test]
    fn host_detector_always_reports_os_type() {
        let detected = HostResourceDetector.detect();
        assert!(detected.get(&Key::new(OS_TYPE)).is_some());
    }
}
