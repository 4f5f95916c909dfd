// Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use topoview::Config;

pub const DEVICES: &str = "\
id,name,type,notes,status,error_info,rack
1,HV-1,高压输入,,normal,,R1
2,ATS-1,开关,市电备路,normal,,R1
3,UPS-1,UPS,,normal,,R2
4,PDU-1,PDU,,normal,,R3
";

/// UPS-1 critical, an unknown device, then PDU-1 major
pub const ALARMS: &str = "\
友好名称,告警等级,信号名称
UPS-1,严重告警,输入失电
GHOST,严重告警,通讯中断
PDU-1,主要告警,过载
";

/// Lay out `static/data/` under `root` and return a config with no step delay
pub fn fixture(root: &Path, alarms: Option<&str>) -> Arc<Config> {
    let data = root.join("static/data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("device_info.csv"), DEVICES).unwrap();
    if let Some(alarms) = alarms {
        std::fs::write(data.join("alarms.csv"), alarms).unwrap();
    }

    let mut config = Config::default();
    config.paths.root = root.to_path_buf();
    config.playback.step_delay_ms = 0;
    config.power_off.step_delay_ms = 0;
    Arc::new(config)
}
