use proptest::prelude::*;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use topoview::{
    AlarmFeed, AlarmRecord, DeviceRecord, DeviceRegistry, DeviceStatus, InstantPacer,
    PlaybackEngine, PlaybackPhase, Result, Severity, SnapshotSink,
};

const SEP: &str = "，信号名称：";

#[derive(Default)]
struct Recorder {
    snapshots: Vec<Vec<DeviceRecord>>,
}

impl SnapshotSink for Recorder {
    fn write(&mut self, registry: &DeviceRegistry) -> Result<()> {
        self.snapshots.push(registry.records().to_vec());
        Ok(())
    }
}

fn alarm(device: usize, severity: Severity) -> AlarmRecord {
    let label = match severity {
        Severity::Critical => "严重告警",
        Severity::Major => "主要告警",
        Severity::Unrecognized => "一般告警",
    };
    AlarmRecord {
        device_name: format!("D{}", device),
        severity_label: label.to_string(),
        severity,
        signal_name: format!("sig-{}", device),
    }
}

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Critical),
        Just(Severity::Major),
        Just(Severity::Unrecognized),
    ]
}

proptest! {
    #[test]
    fn test_at_most_one_device_alarmed_per_snapshot(
        devices in 1usize..6,
        alarms in prop::collection::vec((0usize..8, severity()), 0..30)
    ) {
        let rt = Runtime::new().unwrap();
        let registry = DeviceRegistry::from_records(
            (0..devices).map(|i| DeviceRecord::new(i.to_string(), format!("D{}", i))).collect(),
        );
        let feed = AlarmFeed::from_records(
            alarms.iter().map(|&(d, s)| alarm(d, s)).collect(),
        );

        let mut engine = PlaybackEngine::new(registry, Duration::from_secs(10), SEP);
        let mut sink = Recorder::default();
        let pacer = InstantPacer::new();
        let report = rt
            .block_on(engine.run(&feed, &mut sink, &pacer, &CancellationToken::new()))
            .unwrap();

        prop_assert_eq!(report.phase, PlaybackPhase::Completed);
        prop_assert_eq!(report.steps, alarms.len());
        prop_assert_eq!(sink.snapshots.len(), alarms.len());
        prop_assert_eq!(pacer.pauses().len(), alarms.len());
        prop_assert_eq!(report.matched + report.unmatched, alarms.len());

        for (snapshot, &(target, severity)) in sink.snapshots.iter().zip(&alarms) {
            let alarmed: Vec<&DeviceRecord> = snapshot
                .iter()
                .filter(|r| r.status != DeviceStatus::Normal || !r.error_info.is_empty())
                .collect();
            prop_assert!(alarmed.len() <= 1);

            if target < devices {
                let record = &snapshot[target];
                let expected = alarm(target, severity);
                prop_assert_eq!(&record.error_info, &expected.describe(SEP));
                prop_assert_eq!(record.status, severity.status().unwrap_or(DeviceStatus::Normal));
            } else {
                prop_assert!(alarmed.is_empty());
            }
        }
    }

    #[test]
    fn test_unmatched_alarms_only_count(
        names in prop::collection::vec("[a-z]{1,8}", 1..20)
    ) {
        let rt = Runtime::new().unwrap();
        let registry = DeviceRegistry::from_records(vec![
            DeviceRecord::new("1", "UPS-1"),
            DeviceRecord::new("2", "PDU-1"),
        ]);
        let baseline = registry.records().to_vec();
        let feed = AlarmFeed::from_records(
            names
                .iter()
                .map(|n| AlarmRecord {
                    device_name: n.clone(),
                    severity_label: "严重告警".into(),
                    severity: Severity::Critical,
                    signal_name: "x".into(),
                })
                .collect(),
        );

        let mut engine = PlaybackEngine::new(registry, Duration::ZERO, SEP);
        let mut sink = Recorder::default();
        let report = rt
            .block_on(engine.run(&feed, &mut sink, &InstantPacer::new(), &CancellationToken::new()))
            .unwrap();

        prop_assert_eq!(report.unmatched, names.len());
        prop_assert_eq!(report.snapshots, names.len());
        for snapshot in &sink.snapshots {
            prop_assert_eq!(snapshot, &baseline);
        }
    }
}
