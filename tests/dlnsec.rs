use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use dlnsec::{
    DLnSec, Error, Param, ParameterSet, QuickStartOptions, Response, Transport, TriggerMode,
};

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Write(String),
    Query(String),
}

/// Records every command and answers queries from a script
#[derive(Default)]
struct MockTransport {
    sent: Vec<Sent>,
    responses: VecDeque<Result<String>>,
    fail_writes: bool,
}

impl MockTransport {
    fn answering(responses: &[&str]) -> MockTransport {
        MockTransport {
            responses: responses.iter().map(|r| Ok(r.to_string())).collect(),
            ..MockTransport::default()
        }
    }
}

impl Transport for MockTransport {
    fn write_line(&mut self, cmd: &str) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow!("port disconnected"));
        }
        self.sent.push(Sent::Write(cmd.to_string()));
        Ok(())
    }

    fn query(&mut self, cmd: &str) -> Result<String> {
        self.sent.push(Sent::Query(cmd.to_string()));
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("timeout")))
    }
}

fn laser(responses: &[&str]) -> DLnSec<MockTransport> {
    DLnSec::with_transport(MockTransport::answering(responses), false)
}

fn writes(cmds: &[&str]) -> Vec<Sent> {
    cmds.iter().map(|c| Sent::Write(c.to_string())).collect()
}

fn invalid_field(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<Error>() {
        Some(Error::InvalidParameter { field, .. }) => Some(*field),
        _ => None,
    }
}

#[test]
fn writes_are_acknowledged_with_the_command() {
    let mut laser = laser(&[]);

    let acks = vec![
        laser.save().unwrap(),
        laser.recall().unwrap(),
        laser.restart().unwrap(),
        laser.output_on().unwrap(),
        laser.output_off().unwrap(),
        laser.cw().unwrap(),
        laser.trigger_internal().unwrap(),
        laser.trigger_external().unwrap(),
        laser.stop_laser().unwrap(),
        laser.power(50).unwrap(),
        laser.prescaler(64).unwrap(),
        laser.pulse_width(10).unwrap(),
    ];

    let expected = [
        "*SAV", "*RCL", "*RST", "*ON", "*OFF", "LAS", "INT", "EXT", "STOP", "PWR50", "PRE64",
        "WID10",
    ];
    assert_eq!(laser.transport().sent, writes(&expected));
    for (ack, cmd) in acks.iter().zip(expected) {
        assert!(!cmd.ends_with('?'));
        assert_eq!(ack.to_string(), format!("Sent: {cmd}"));
        assert_eq!(*ack, Response::Sent(cmd.to_string()));
    }
}

#[test]
fn queries_keep_the_marker() {
    let mut laser = laser(&["0", "3", "50", "1024", "255"]);

    laser.error().unwrap();
    laser.n_saved().unwrap();
    laser.power(Param::Query).unwrap();
    laser.prescaler(Param::Query).unwrap();
    laser.pulse_width(Param::Query).unwrap();

    let expected = ["ERR?", "NSAV?", "PWR?", "PRE?", "WID?"];
    let sent: Vec<Sent> = expected.iter().map(|c| Sent::Query(c.to_string())).collect();
    assert_eq!(laser.transport().sent, sent);
}

#[test]
fn identify_and_howdy_are_sent_without_marker() {
    let mut laser = laser(&["DLnSec 1.2", "HOWDY PARTNER"]);

    assert_eq!(laser.identify().unwrap(), Response::Text("DLnSec 1.2".into()));
    assert_eq!(laser.howdy().unwrap(), Response::Text("HOWDY PARTNER".into()));

    assert_eq!(
        laser.transport().sent,
        vec![Sent::Query("*IDN".into()), Sent::Query("HOWDY".into())]
    );
}

#[test]
fn com_strips_only_the_exact_non_conforming_queries() {
    let mut laser = laser(&["a", "b", "c"]);

    laser.com("*IDN?").unwrap();
    laser.com("IDN?").unwrap();
    laser.com("HOWDY?X?").unwrap();

    assert_eq!(
        laser.transport().sent,
        vec![
            Sent::Query("*IDN".into()),
            Sent::Query("IDN?".into()),
            Sent::Query("HOWDY?X?".into()),
        ]
    );
}

#[test]
fn numeric_responses_become_numbers() {
    let mut laser = laser(&["42.5", "READY"]);

    assert_eq!(laser.power(Param::Query).unwrap(), Response::Number(42.5));
    assert_eq!(laser.error().unwrap(), Response::Text("READY".into()));
}

#[test]
fn empty_command_is_rejected() {
    let mut laser = laser(&[]);
    let err = laser.com("").unwrap_err();
    assert_eq!(invalid_field(&err), Some("command"));
    assert!(laser.transport().sent.is_empty());
}

#[test]
fn power_is_range_checked() {
    let mut laser = laser(&[]);

    laser.power(0).unwrap();
    laser.pow(100).unwrap();
    let err = laser.power(101).unwrap_err();

    assert_eq!(invalid_field(&err), Some("power"));
    assert_eq!(laser.transport().sent, writes(&["PWR0", "PWR100"]));
}

#[test]
fn invalid_prescaler_fails() {
    let mut laser = laser(&[]);

    for prescale in [0, 2, 7, 100, 512, 2048] {
        let err = laser.prescaler(prescale).unwrap_err();
        assert_eq!(invalid_field(&err), Some("prescaler"));
    }
    assert!(laser.transport().sent.is_empty());

    for prescale in [1, 8, 64, 256, 1024] {
        laser.prescaler(prescale).unwrap();
    }
    assert_eq!(
        laser.transport().sent,
        writes(&["PRE1", "PRE8", "PRE64", "PRE256", "PRE1024"])
    );
}

#[test]
fn invalid_pulse_width_fails() {
    let mut laser = laser(&[]);

    let err = laser.pulse_width(256).unwrap_err();
    assert_eq!(invalid_field(&err), Some("pulse width"));
    assert!(laser.transport().sent.is_empty());

    laser.pulse_width(0).unwrap();
    laser.pulse_width(255).unwrap();
    assert_eq!(laser.transport().sent, writes(&["WID0", "WID255"]));
}

#[test]
fn trigger_modes_send_one_command() {
    for (name, cmd) in [
        ("int", "INT"),
        ("internal", "INT"),
        ("ext", "EXT"),
        ("external", "EXT"),
        ("cw", "LAS"),
        ("continuous", "LAS"),
    ] {
        let mut laser = laser(&[]);
        laser.trigger(name.parse().unwrap()).unwrap();
        assert_eq!(laser.transport().sent, writes(&[cmd]), "mode {name}");
    }
}

#[test]
fn continuous_wave_only_when_selected() {
    let mut laser = laser(&[]);
    laser.trigger(TriggerMode::Internal).unwrap();
    laser.trigger(TriggerMode::External).unwrap();
    assert_eq!(laser.transport().sent, writes(&["INT", "EXT"]));
}

#[test]
fn unknown_trigger_name_sends_nothing() {
    let mut laser = laser(&[]);

    let err = laser.trigger_by_name("wc").unwrap_err();
    assert_eq!(invalid_field(&err), Some("trigger mode"));
    assert!(laser.transport().sent.is_empty());

    laser.trigger_by_name("cw").unwrap();
    assert_eq!(laser.transport().sent, writes(&["LAS"]));
}

#[test]
fn quick_cw_sequence() {
    let mut laser = laser(&[]);
    laser.quick_cw(50).unwrap();
    assert_eq!(laser.transport().sent, writes(&["LAS", "PWR50", "*ON"]));
}

#[test]
fn quick_cw_rejects_power_before_sending() {
    let mut laser = laser(&[]);
    assert!(laser.quick_cw(150).is_err());
    assert!(laser.transport().sent.is_empty());
}

#[test]
fn quick_start_per_trigger_mode() {
    let mut laser = laser(&[]);
    laser.quick_start(20, TriggerMode::Internal).unwrap();
    assert_eq!(
        laser.transport().sent,
        writes(&["INT", "PRE1024", "WID255", "PWR20", "*ON"])
    );

    let mut laser = self::laser(&[]);
    laser
        .quick_start(
            20,
            QuickStartOptions {
                trigger: Some(TriggerMode::Internal),
                prescale: 8,
                pulse_width: 3,
            },
        )
        .unwrap();
    assert_eq!(
        laser.transport().sent,
        writes(&["INT", "PRE8", "WID3", "PWR20", "*ON"])
    );

    let mut laser = self::laser(&[]);
    laser.quick_start(30, TriggerMode::External).unwrap();
    assert_eq!(laser.transport().sent, writes(&["EXT", "PWR30", "*ON"]));

    let mut laser = self::laser(&[]);
    laser.quick_start(40, TriggerMode::ContinuousWave).unwrap();
    assert_eq!(laser.transport().sent, writes(&["LAS", "PWR40", "*ON"]));

    let mut laser = self::laser(&[]);
    laser.quick_start(60, QuickStartOptions::default()).unwrap();
    assert_eq!(laser.transport().sent, writes(&["PWR60", "*ON"]));
}

#[test]
fn quick_start_validates_internal_trigger_settings() {
    let mut laser = laser(&[]);
    let options = QuickStartOptions {
        trigger: Some(TriggerMode::Internal),
        prescale: 3,
        pulse_width: 255,
    };
    let err = laser.quick_start(20, options).unwrap_err();
    assert_eq!(invalid_field(&err), Some("prescaler"));
    assert!(laser.transport().sent.is_empty());

    // prescale and pulse width are unused by the external trigger
    let options = QuickStartOptions {
        trigger: Some(TriggerMode::External),
        ..options
    };
    laser.quick_start(20, options).unwrap();
    assert_eq!(laser.transport().sent, writes(&["EXT", "PWR20", "*ON"]));
}

#[test]
fn transport_failure_aborts_sequence() {
    let mut laser = DLnSec::with_transport(
        MockTransport {
            fail_writes: true,
            ..MockTransport::default()
        },
        false,
    );

    let err = laser.quick_cw(50).unwrap_err();
    assert_eq!(err.to_string(), "port disconnected");
    assert!(laser.transport().sent.is_empty());
}

#[test]
fn handle_is_usable_after_transport_failure() {
    let mut laser = laser(&[]);

    assert!(laser.error().is_err());
    laser.output_off().unwrap();

    assert_eq!(
        laser.transport().sent,
        vec![Sent::Query("ERR?".into()), Sent::Write("*OFF".into())]
    );
}

#[test]
fn get_parameters_queries_in_order() {
    let mut laser = laser(&["50", "1024", "255"]);

    let params = laser.get_parameters().unwrap();

    assert_eq!(
        laser.transport().sent,
        vec![
            Sent::Query("PWR?".into()),
            Sent::Query("PRE?".into()),
            Sent::Query("WID?".into()),
        ]
    );
    let map = params.to_map();
    assert_eq!(map.len(), 3);
    assert_eq!(map["power"], Response::Number(50.0));
    assert_eq!(map["prescale"], Response::Number(1024.0));
    assert_eq!(map["pulse_width"], Response::Number(255.0));
}

#[test]
fn get_parameters_fails_on_any_query() {
    let mut laser = laser(&["50", "1024"]);
    assert!(laser.get_parameters().is_err());
    assert_eq!(laser.transport().sent.len(), 3);
}

#[test]
fn set_parameters_sends_provided_fields() {
    let mut laser = laser(&[]);

    laser
        .set_parameters(&ParameterSet::new().pulse_width(12).power(70))
        .unwrap();
    laser.set_parameters(&ParameterSet::new()).unwrap();
    laser
        .set_parameters(&ParameterSet::new().prescale(256))
        .unwrap();

    assert_eq!(laser.transport().sent, writes(&["PWR70", "WID12", "PRE256"]));
}

#[test]
fn set_parameters_sends_nothing_when_invalid() {
    let mut laser = laser(&[]);

    let err = laser
        .set_parameters(&ParameterSet::new().power(70).prescale(100))
        .unwrap_err();

    assert_eq!(invalid_field(&err), Some("prescaler"));
    assert!(laser.transport().sent.is_empty());
}

#[test]
fn verbose_does_not_change_responses() {
    let mut laser = DLnSec::with_transport(MockTransport::answering(&["7"]), true);
    assert!(laser.verbose());

    assert_eq!(laser.n_saved().unwrap(), Response::Number(7.0));
    laser.set_verbose(false);
    assert_eq!(laser.output_on().unwrap().to_string(), "Sent: *ON");

    let transport = laser.into_transport();
    assert_eq!(
        transport.sent,
        vec![Sent::Query("NSAV?".into()), Sent::Write("*ON".into())]
    );
}

#[test]
fn boxed_transport() {
    let transport: Box<dyn Transport> = Box::new(MockTransport::answering(&["1"]));
    let mut laser = DLnSec::with_transport(transport, false);
    assert_eq!(laser.power(Param::Query).unwrap(), Response::Number(1.0));
}

#[test]
fn opening_an_invalid_resource_fails() {
    let err = DLnSec::open("USB0::0x1234::0x5678::SN::INSTR", false).err().unwrap();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidResource(_))));
}
