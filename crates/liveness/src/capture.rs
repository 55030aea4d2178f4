//! Camera access.

use liveness_detect::VideoFrame;
use liveness_session::{CameraInfo, DeviceInfo};

/// Errors from the capture device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The user or the platform refused camera access. The session can
    /// retry after the user changes their mind.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// No usable camera, or it stopped delivering frames.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// Recording or chunk encoding failed.
    #[error("recording failed: {0}")]
    Recording(String),
}

/// A camera that can be sampled for detection and recorded for upload.
///
/// Calls are synchronous and expected to be quick: `frame` returns the
/// latest decoded frame, `take_chunk` whatever encoded video has
/// accumulated since the last call.
pub trait CaptureDevice: Send + Sync + 'static {
    /// Opens `device_id`, or the default camera.
    fn open(&self, device_id: Option<&str>) -> Result<CameraInfo, CaptureError>;

    /// Cameras the user could switch to.
    fn devices(&self) -> Vec<DeviceInfo>;

    /// The most recent frame.
    fn frame(&self) -> Result<VideoFrame, CaptureError>;

    fn start_recording(&self) -> Result<(), CaptureError>;

    /// Encoded video since the previous call, if any.
    fn take_chunk(&self) -> Result<Option<Vec<u8>>, CaptureError>;

    /// Stops recording and returns the final encoded chunk, if any.
    fn stop_recording(&self) -> Result<Option<Vec<u8>>, CaptureError>;

    /// Stops the camera and frees the device. Called once, when a session
    /// that opened the camera ends, however it ends.
    fn release(&self) -> Result<(), CaptureError>;
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for std::sync::Arc<D> {
    fn open(&self, device_id: Option<&str>) -> Result<CameraInfo, CaptureError> {
        (**self).open(device_id)
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        (**self).devices()
    }

    fn frame(&self) -> Result<VideoFrame, CaptureError> {
        (**self).frame()
    }

    fn start_recording(&self) -> Result<(), CaptureError> {
        (**self).start_recording()
    }

    fn take_chunk(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        (**self).take_chunk()
    }

    fn stop_recording(&self) -> Result<Option<Vec<u8>>, CaptureError> {
        (**self).stop_recording()
    }

    fn release(&self) -> Result<(), CaptureError> {
        (**self).release()
    }
}
