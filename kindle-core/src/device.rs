//! Instance creation and physical/logical device selection.
//!
//! Selection takes the first enumerated physical
//! device, one queue from family 0. There is no scoring by queue capability,
//! memory or surface compatibility.

use log::{info, warn};

use crate::graphics::{ApplicationIdentity, InstanceDescriptor, QueueRequest};
use crate::{Graphics, KindleError, KindleResult, Owned};
use raw_window_handle::RawDisplayHandle;

/// The subset of device features this crate cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    pub geometry_shader: bool,
    pub tessellation_shader: bool,
    pub multi_draw_indirect: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    GeometryShader,
    TessellationShader,
    MultiDrawIndirect,
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::GeometryShader => "geometryShader",
            Feature::TessellationShader => "tessellationShader",
            Feature::MultiDrawIndirect => "multiDrawIndirect",
        }
    }

    fn get(self, features: &DeviceFeatures) -> bool {
        match self {
            Feature::GeometryShader => features.geometry_shader,
            Feature::TessellationShader => features.tessellation_shader,
            Feature::MultiDrawIndirect => features.multi_draw_indirect,
        }
    }

    fn set(self, features: &mut DeviceFeatures, enabled: bool) {
        match self {
            Feature::GeometryShader => features.geometry_shader = enabled,
            Feature::TessellationShader => features.tessellation_shader = enabled,
            Feature::MultiDrawIndirect => features.multi_draw_indirect = enabled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Device creation is refused without it.
    Mandatory,
    /// Enabled exactly when the hardware supports it.
    Mirrored,
}

pub const REQUIRED_FEATURES: &[(Feature, Requirement)] = &[
    (Feature::GeometryShader, Requirement::Mandatory),
    (Feature::TessellationShader, Requirement::Mandatory),
    (Feature::MultiDrawIndirect, Requirement::Mirrored),
];

/// Features to request from a device supporting `supported`.
pub fn resolve_features(supported: &DeviceFeatures) -> KindleResult<DeviceFeatures> {
    let mut enabled = DeviceFeatures::default();
    for &(feature, requirement) in REQUIRED_FEATURES {
        let available = feature.get(supported);
        if requirement == Requirement::Mandatory && !available {
            return Err(KindleError::UnsupportedFeature {
                feature: feature.name(),
            });
        }
        feature.set(&mut enabled, available);
    }
    Ok(enabled)
}

pub fn create_instance<G: Graphics>(
    graphics: &mut G,
    application: &ApplicationIdentity,
    display: RawDisplayHandle,
    validation: bool,
) -> KindleResult<Owned<G::Instance>> {
    let extensions = graphics.platform_extensions(display)?;
    info!("Creating graphics instance for {} with {:?}", application.name, extensions);
    graphics.create_instance(&InstanceDescriptor {
        application,
        extensions: &extensions,
        validation,
    })
}

/// Physical devices in the order the instance reports them. May be empty.
pub fn enumerate_devices<G: Graphics>(graphics: &G, instance: &G::Instance) -> KindleResult<Vec<G::PhysicalDevice>> {
    let devices = graphics.enumerate_devices(instance)?;
    info!("Found {} physical devices", devices.len());
    Ok(devices)
}

pub fn select_device<P: Copy>(devices: &[P]) -> KindleResult<P> {
    let Some(&device) = devices.first() else {
        return Err(KindleError::NoSuitableDevice);
    };
    if devices.len() > 1 {
        warn!("{} devices available, using the first one", devices.len());
    }
    Ok(device)
}

pub fn query_features<G: Graphics>(graphics: &G, instance: &G::Instance, device: G::PhysicalDevice) -> DeviceFeatures {
    graphics.device_features(instance, device)
}

/// Creates the logical device, refusing before any native call when a
/// mandatory feature is missing. Returns the device together with the
/// feature set it was created with.
pub fn create_logical_device<G: Graphics>(
    graphics: &mut G,
    instance: &G::Instance,
    device: G::PhysicalDevice,
) -> KindleResult<(Owned<G::Device>, DeviceFeatures)> {
    let supported = query_features(graphics, instance, device);
    let enabled = resolve_features(&supported)?;
    if !enabled.multi_draw_indirect {
        info!("multiDrawIndirect not supported, leaving it disabled");
    }
    let logical = graphics.create_device(instance, device, &enabled, &[QueueRequest::first_family()])?;
    Ok((logical, enabled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> DeviceFeatures {
        DeviceFeatures {
            geometry_shader: true,
            tessellation_shader: true,
            multi_draw_indirect: true,
        }
    }

    #[test]
    fn optional_feature_mirrors_hardware() {
        let mut supported = full();
        assert_eq!(resolve_features(&supported).unwrap(), full());

        supported.multi_draw_indirect = false;
        let enabled = resolve_features(&supported).unwrap();
        assert!(!enabled.multi_draw_indirect);
        assert!(enabled.geometry_shader && enabled.tessellation_shader);
    }

    #[test]
    fn missing_mandatory_feature_is_named() {
        let supported = DeviceFeatures {
            tessellation_shader: false,
            ..full()
        };
        assert_eq!(
            resolve_features(&supported),
            Err(KindleError::UnsupportedFeature { feature: "tessellationShader" })
        );
    }

    #[test]
    fn first_device_wins() {
        assert_eq!(select_device(&[4, 2, 9]), Ok(4));
        assert_eq!(select_device::<u32>(&[]), Err(KindleError::NoSuitableDevice));
    }
}
