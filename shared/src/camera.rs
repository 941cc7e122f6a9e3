use serde::Serialize;

use crate::error::CameraError;

#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    fn label_hint(self) -> &'static str {
        match self {
            FacingMode::User => "front",
            FacingMode::Environment => "back",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDevice {
    pub device_id: String,
    pub label: String,
}

impl CameraDevice {
    pub fn new(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
        }
    }

    fn label_contains(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle)
    }

    pub fn is_rear_facing(&self) -> bool {
        self.label_contains("back") || self.label_contains("rear")
    }
}

pub fn preferred_device(devices: &[CameraDevice]) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|device| device.is_rear_facing())
        .or_else(|| devices.first())
}

pub fn device_facing(devices: &[CameraDevice], facing: FacingMode) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|device| device.label_contains(facing.label_hint()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraRequest {
    Device(String),
    Facing(FacingMode),
    Any,
}

#[derive(Serialize)]
struct ExactConstraint<'a> {
    exact: &'a str,
}

#[derive(Serialize)]
#[serde(untagged)]
enum VideoConstraints<'a> {
    Any(bool),
    Device {
        #[serde(rename = "deviceId")]
        device_id: ExactConstraint<'a>,
    },
    Facing {
        #[serde(rename = "facingMode")]
        facing_mode: FacingMode,
    },
}

#[derive(Serialize)]
pub struct MediaConstraints<'a> {
    video: VideoConstraints<'a>,
}

impl CameraRequest {
    pub fn constraints(&self) -> MediaConstraints<'_> {
        let video = match self {
            CameraRequest::Device(device_id) => VideoConstraints::Device {
                device_id: ExactConstraint { exact: device_id },
            },
            CameraRequest::Facing(facing_mode) => VideoConstraints::Facing {
                facing_mode: *facing_mode,
            },
            CameraRequest::Any => VideoConstraints::Any(true),
        };
        MediaConstraints { video }
    }

    pub fn fallback(&self) -> Option<CameraRequest> {
        match self {
            CameraRequest::Device(_) | CameraRequest::Facing(_) => Some(CameraRequest::Any),
            CameraRequest::Any => None,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        match self {
            CameraRequest::Device(device_id) => Some(device_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CameraStatus {
    Inactive,
    Starting,
    Active { device_id: Option<String> },
    Failed(CameraError),
}

#[derive(Clone, Debug)]
pub struct CameraSession {
    status: CameraStatus,
    devices: Vec<CameraDevice>,
    facing: FacingMode,
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSession {
    pub fn new() -> Self {
        Self {
            status: CameraStatus::Inactive,
            devices: Vec::new(),
            facing: FacingMode::default(),
        }
    }

    pub fn status(&self) -> &CameraStatus {
        &self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, CameraStatus::Active { .. })
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn current_device_id(&self) -> Option<&str> {
        match &self.status {
            CameraStatus::Active { device_id } => device_id.as_deref(),
            _ => None,
        }
    }

    pub fn set_devices(&mut self, devices: Vec<CameraDevice>) {
        self.devices = devices;
    }

    /// Initial request: the preferred enumerated device, or the facing mode
    /// when labels are not available yet.
    pub fn initial_request(&self) -> CameraRequest {
        match preferred_device(&self.devices) {
            Some(device) if !device.device_id.is_empty() && !device.label.is_empty() => {
                CameraRequest::Device(device.device_id.clone())
            }
            _ => CameraRequest::Facing(self.facing),
        }
    }

    pub fn switch_request(&mut self) -> CameraRequest {
        self.facing = self.facing.toggled();
        match device_facing(&self.devices, self.facing) {
            Some(device) => CameraRequest::Device(device.device_id.clone()),
            None => CameraRequest::Facing(self.facing),
        }
    }

    pub fn starting(&mut self) {
        self.status = CameraStatus::Starting;
    }

    /// Records the request the browser granted, which after a fallback is not
    /// the one originally asked for.
    pub fn started(&mut self, granted: &CameraRequest) {
        let device_id = granted.device_id().map(str::to_string);
        tracing::info!(?device_id, "camera active");
        self.status = CameraStatus::Active { device_id };
    }

    pub fn failed(&mut self, error: CameraError) {
        tracing::warn!(%error, "camera failed");
        self.status = CameraStatus::Failed(error);
    }

    pub fn stopped(&mut self) {
        self.status = CameraStatus::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<CameraDevice> {
        vec![
            CameraDevice::new("a", "FaceTime HD Camera (front)"),
            CameraDevice::new("b", "Rear Wide Camera"),
            CameraDevice::new("c", "Back Ultra Wide"),
        ]
    }

    #[test]
    fn rear_camera_is_preferred() {
        let devices = devices();
        assert_eq!(preferred_device(&devices).map(|d| d.device_id.as_str()), Some("b"));
    }

    #[test]
    fn first_device_when_none_is_rear() {
        let devices = vec![CameraDevice::new("x", "USB Cam"), CameraDevice::new("y", "")];
        assert_eq!(preferred_device(&devices).map(|d| d.device_id.as_str()), Some("x"));
        assert_eq!(preferred_device(&[]), None);
    }

    #[test]
    fn constraints_serialize_like_media_stream_constraints() {
        let device = serde_json::to_string(&CameraRequest::Device("abc".into()).constraints())
            .unwrap();
        assert_eq!(device, r#"{"video":{"deviceId":{"exact":"abc"}}}"#);
        let facing =
            serde_json::to_string(&CameraRequest::Facing(FacingMode::Environment).constraints())
                .unwrap();
        assert_eq!(facing, r#"{"video":{"facingMode":"environment"}}"#);
        let any = serde_json::to_string(&CameraRequest::Any.constraints()).unwrap();
        assert_eq!(any, r#"{"video":true}"#);
    }

    #[test]
    fn specific_requests_fall_back_to_any_camera() {
        assert_eq!(
            CameraRequest::Device("abc".into()).fallback(),
            Some(CameraRequest::Any)
        );
        assert_eq!(CameraRequest::Any.fallback(), None);
    }

    #[test]
    fn switching_toggles_facing_and_matches_labels() {
        let mut session = CameraSession::new();
        session.set_devices(devices());
        assert_eq!(session.initial_request(), CameraRequest::Device("b".into()));
        assert_eq!(session.switch_request(), CameraRequest::Device("a".into()));
        assert_eq!(session.switch_request(), CameraRequest::Device("c".into()));
    }

    #[test]
    fn fallback_stream_does_not_claim_the_requested_device() {
        let mut session = CameraSession::new();
        session.set_devices(devices());
        let requested = session.initial_request();
        session.starting();
        let granted = requested.fallback().unwrap();
        session.started(&granted);
        assert!(session.is_active());
        assert_eq!(session.current_device_id(), None);
        assert_eq!(
            *session.status(),
            CameraStatus::Active { device_id: None }
        );
    }

    #[test]
    fn unlabelled_devices_use_facing_mode() {
        let mut session = CameraSession::new();
        assert_eq!(
            session.initial_request(),
            CameraRequest::Facing(FacingMode::Environment)
        );
        session.set_devices(vec![CameraDevice::new("cam-1", "")]);
        assert_eq!(
            session.initial_request(),
            CameraRequest::Facing(FacingMode::Environment)
        );
        assert_eq!(
            session.switch_request(),
            CameraRequest::Facing(FacingMode::User)
        );
    }

    #[test]
    fn status_transitions() {
        let mut session = CameraSession::new();
        session.starting();
        assert!(!session.is_active());
        session.started(&CameraRequest::Device("b".into()));
        assert_eq!(session.current_device_id(), Some("b"));
        session.failed(CameraError::InUse);
        assert!(!session.is_active());
        session.stopped();
        assert_eq!(*session.status(), CameraStatus::Inactive);
    }
}
