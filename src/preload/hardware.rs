use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;

/// Hardware facts shown in the live application.
pub(crate) type HardwareInfo = BTreeMap<String, String>;

/// Best-effort hardware detection. Errors are never fatal to the launch.
pub(crate) trait HardwareProbe: Send + Sync {
    fn probe(&self) -> Result<Option<HardwareInfo>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemHardwareProbe;

impl HardwareProbe for SystemHardwareProbe {
    fn probe(&self) -> Result<Option<HardwareInfo>> {
        let mut info = HardwareInfo::new();
        info.insert("os".into(), std::env::consts::OS.into());
        info.insert("arch".into(), std::env::consts::ARCH.into());
        let cores = std::thread::available_parallelism()?;
        info.insert("logical_cores".into(), cores.to_string());

        match detect_gpu(Path::new("/"))? {
            Some(gpu) => info.extend(gpu),
            None => {
                info.insert("gpu".into(), "none".into());
            }
        }
        Ok(Some(info))
    }
}

const PCI_VENDORS: &[(&str, &str)] = &[
    ("0x10de", "NVIDIA"),
    ("0x1002", "AMD"),
    ("0x8086", "Intel"),
    ("0x13b5", "ARM"),
    ("0x5143", "Qualcomm"),
];

/// Looks for a DRM render device under `root` (normally `/`).
fn detect_gpu(root: &Path) -> Result<Option<HardwareInfo>> {
    let drm = root.join("sys/class/drm");
    if !drm.is_dir() {
        return Ok(None);
    }

    let mut cards: Vec<_> = fs::read_dir(&drm)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("card") && !name.contains('-'))
        .collect();
    cards.sort();

    for card in cards {
        let device = drm.join(&card).join("device");
        let Ok(vendor_id) = fs::read_to_string(device.join("vendor")) else {
            continue;
        };
        let vendor_id = vendor_id.trim().to_ascii_lowercase();
        let vendor = PCI_VENDORS
            .iter()
            .find(|(id, _)| *id == vendor_id)
            .map(|(_, name)| (*name).to_string())
            .unwrap_or_else(|| format!("unknown ({vendor_id})"));

        let mut gpu = HardwareInfo::new();
        gpu.insert("gpu".into(), vendor);
        gpu.insert("gpu_device".into(), card);
        if let Ok(driver) = fs::read_link(device.join("driver")) {
            if let Some(name) = driver.file_name() {
                gpu.insert("gpu_driver".into(), name.to_string_lossy().into_owned());
            }
        }
        if let Ok(version) = fs::read_to_string(root.join("proc/driver/nvidia/version")) {
            if let Some(first) = version.lines().next() {
                gpu.insert("nvidia_driver".into(), first.trim().to_string());
            }
        }
        return Ok(Some(gpu));
    }
    Ok(None)
}
