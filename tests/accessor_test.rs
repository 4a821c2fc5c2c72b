//! Attribute access against the simulated session.

use rs_siggen::attribute::{Attribute, AttributeValue, ValueKind};
use rs_siggen::driver::{DriverOptions, SmDriver};
use rs_siggen::error::DriverError;
use rs_siggen::model::InstrumentModel;
use rs_siggen::session::{SessionEvent, SimulatedSession};
use rs_siggen::traits::{
    ArbGenerator, ArbTriggerSource, IqSource, LfGenerator, LfGeneratorOutput, LfWaveform,
    ModulateIq, RfBase,
};

async fn open(session: SimulatedSession) -> SmDriver {
    let mut driver = SmDriver::new(InstrumentModel::Smbv100a);
    driver
        .initialize(Box::new(session.clone()), DriverOptions::default())
        .await
        .unwrap();
    session.clear_transcript();
    driver
}

fn float_attributes() -> Vec<Attribute> {
    Attribute::ALL
        .into_iter()
        .filter(|a| a.descriptor().kind == ValueKind::Float)
        .collect()
}

fn bool_attributes() -> Vec<Attribute> {
    Attribute::ALL
        .into_iter()
        .filter(|a| a.descriptor().kind == ValueKind::Bool)
        .collect()
}

#[tokio::test]
async fn float_attributes_round_trip_through_exponent_format() {
    let session = SimulatedSession::for_model("SMBV100A");
    let mut driver = open(session).await;

    for attribute in float_attributes() {
        for written in [1.234567e9, -35.5, 0.0, 2.5e-3] {
            driver.set(attribute, written).await.unwrap();
            let read = driver.get(attribute).await.unwrap().as_f64().unwrap();
            let tolerance = written.abs() * 1e-6;
            assert!(
                (read - written).abs() <= tolerance,
                "{attribute}: wrote {written}, read {read}"
            );
        }
    }
}

#[tokio::test]
async fn float_write_uses_c_exponent_notation() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_rf_frequency(1e9).await.unwrap();
    driver.set_rf_level(-12.5).await.unwrap();
    assert_eq!(
        wire.writes(),
        vec![
            ":SOUR:FREQ:CW 1.000000e+09",
            ":SOUR:POW:LEV:IMM:AMPL -1.250000e+01"
        ]
    );
}

#[tokio::test]
async fn boolean_writes_use_numeric_literals() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    for attribute in bool_attributes() {
        wire.clear_transcript();
        driver.set(attribute, true).await.unwrap();
        driver.set(attribute, false).await.unwrap();
        let writes = wire.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[0].ends_with(" 1"), "{attribute}: {}", writes[0]);
        assert!(writes[1].ends_with(" 0"), "{attribute}: {}", writes[1]);
    }
}

#[tokio::test]
async fn boolean_reads_parse_integers_and_fall_back_to_false() {
    for attribute in bool_attributes() {
        let query = match attribute.descriptor().read {
            rs_siggen::attribute::ReadPlan::Query(q) => q,
            rs_siggen::attribute::ReadPlan::CacheOnly => continue,
        };
        for (response, expected) in [("1", true), ("0", false), ("  1\n", true), ("ON?", false)] {
            let session = SimulatedSession::for_model("SMBV100A").with_response(query, response);
            let mut driver = open(session).await;
            assert_eq!(
                driver.get(attribute).await.unwrap(),
                AttributeValue::Bool(expected),
                "{attribute} <- {response:?}"
            );
        }
    }
}

#[tokio::test]
async fn numeric_reads_fall_back_on_garbage() {
    let fallbacks = [
        (Attribute::RfFrequency, ":SOUR:FREQ:CW?", 0.0),
        (Attribute::RfLevel, ":SOUR:POW:LEV:IMM:AMPL?", 0.0),
        (Attribute::LfGeneratorFrequency, ":SOUR:LFO:FREQ?", 0.0),
        (Attribute::LfGeneratorOutputAmplitude, ":SOUR:LFO:VOLT?", 1.0),
        (Attribute::ArbClockFrequency, ":SOUR:BB:ARB:WAV:CLOCK?", 0.0),
    ];

    for (attribute, query, fallback) in fallbacks {
        for response in ["", "garbage", "1.0 GHz"] {
            let session = SimulatedSession::for_model("SMBV100A").with_response(query, response);
            let mut driver = open(session).await;
            let value = driver.get(attribute).await.unwrap();
            assert_eq!(value, AttributeValue::Float(fallback), "{attribute} <- {response:?}");
        }
    }
}

#[tokio::test]
async fn waveform_read_falls_back_to_sine() {
    let session = SimulatedSession::for_model("SMBV100A").with_response(":SOUR:LFO:SHAP?", "");
    let mut driver = open(session).await;
    assert_eq!(driver.lf_waveform().await.unwrap(), LfWaveform::Sine);

    let session =
        SimulatedSession::for_model("SMBV100A").with_response(":SOUR:LFO:SHAP?", "SQU");
    let mut driver = open(session).await;
    assert_eq!(driver.lf_waveform().await.unwrap(), LfWaveform::Square);
}

#[tokio::test]
async fn out_of_domain_writes_issue_no_io() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    let cases = [
        (Attribute::LfGeneratorWaveform, "sawtooth"),
        (Attribute::IqSource, "internal"),
        (Attribute::ArbTriggerSource, "bus"),
    ];
    for (attribute, value) in cases {
        let result = driver.set(attribute, value).await;
        assert!(
            matches!(result, Err(DriverError::ValueNotSupported { .. })),
            "{attribute} accepted {value}"
        );
    }
    assert!(wire.transcript().is_empty());
}

#[tokio::test]
async fn iq_source_arb_generator_sends_three_writes() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_iq_source(IqSource::ArbGenerator).await.unwrap();
    assert_eq!(
        wire.writes(),
        vec![
            ":SOUR:BB:ARB:STAT 0",
            ":SOUR:BB:DM:STAT 0",
            ":SOUR:IQ:SOUR BAS;:SOUR:BB:ARB:STAT 1"
        ]
    );
    assert_eq!(driver.iq_source().await.unwrap(), IqSource::ArbGenerator);
    assert!(wire.queries().is_empty());
}

#[tokio::test]
async fn iq_source_external_selects_analog_input() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_iq_source(IqSource::External).await.unwrap();
    let writes = wire.writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[2], ":SOUR:IQ:SOUR ANAL");
}

#[tokio::test]
async fn arb_trigger_external_sends_two_writes() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver
        .set_arb_trigger_source(ArbTriggerSource::External)
        .await
        .unwrap();
    assert_eq!(
        wire.writes(),
        vec![":SOUR:BB:ARB:TRIG:SEQ SING", ":SOUR:BB:ARB:TRIG:SOUR EXT"]
    );
    assert_eq!(
        driver.arb_trigger_source().await.unwrap(),
        ArbTriggerSource::External
    );
}

#[tokio::test]
async fn arb_trigger_immediate_runs_free() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver
        .set_arb_trigger_source(ArbTriggerSource::Immediate)
        .await
        .unwrap();
    assert_eq!(wire.writes(), vec![":SOUR:BB:ARB:TRIG:SEQ AUTO"]);
}

#[tokio::test]
async fn cache_only_attributes_need_a_prior_write() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    assert!(matches!(
        driver.iq_source().await,
        Err(DriverError::NotCached(key)) if key == "iq_source"
    ));
    assert!(matches!(
        driver.arb_trigger_source().await,
        Err(DriverError::NotCached(_))
    ));
    assert!(wire.transcript().is_empty());
}

#[tokio::test]
async fn arb_clock_reads_its_own_query() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_arb_clock_frequency(1e8).await.unwrap();
    driver
        .set_arb_selected_waveform("/var/user/qpsk.wv")
        .await
        .unwrap();
    assert_eq!(driver.arb_clock_frequency().await.unwrap(), 1e8);
    assert_eq!(
        driver.arb_selected_waveform().await.unwrap(),
        "/var/user/qpsk.wv"
    );
    assert_eq!(
        wire.queries(),
        vec![":SOUR:BB:ARB:WAV:CLOCK?", ":SOUR:BB:ARB:WAV:SEL?"]
    );
}

#[tokio::test]
async fn waveform_name_with_separator_reads_back() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_arb_selected_waveform("a;b").await.unwrap();
    assert_eq!(wire.writes(), vec![":SOUR:BB:ARB:WAV:SEL 'a;b'"]);
    assert_eq!(driver.arb_selected_waveform().await.unwrap(), "a;b");
}

#[tokio::test]
async fn lf_generator_settings() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_lf_frequency(1e3).await.unwrap();
    driver.set_lf_waveform(LfWaveform::Triangle).await.unwrap();
    driver.set_lf_output_amplitude(0.5).await.unwrap();
    driver.set_lf_output_enabled(true).await.unwrap();

    assert_eq!(
        wire.writes(),
        vec![
            ":SOUR:LFO:FREQ 1.000000e+03",
            ":SOUR:LFO:SHAP triangle",
            ":SOUR:LFO:VOLT 5.000000e-01",
            ":SOUR:LFO:STAT 1"
        ]
    );
    assert_eq!(driver.lf_waveform().await.unwrap(), LfWaveform::Triangle);
    assert_eq!(driver.lf_output_amplitude().await.unwrap(), 0.5);
    assert!(driver.lf_output_enabled().await.unwrap());
}

#[tokio::test]
async fn transport_errors_pass_through() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    wire.inject_next_failure();
    let err = driver.rf_output_enabled().await.unwrap_err();
    assert!(matches!(err, DriverError::Transport(_)));
    assert_eq!(err.to_string(), "Injected failure");
}

#[tokio::test]
async fn failed_iq_step_is_not_undone() {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = open(session).await;

    driver.set_iq_source(IqSource::External).await.unwrap();
    wire.clear_transcript();

    wire.inject_next_failure();
    assert!(driver
        .set_iq_source(IqSource::DigitalModulationBase)
        .await
        .is_err());
    assert_eq!(
        wire.transcript().last(),
        Some(&SessionEvent::Write(":SOUR:BB:ARB:STAT 0".to_string()))
    );
    assert!(driver.cached(Attribute::IqSource).is_none());
}

#[tokio::test]
async fn amu_rejects_rf_without_io() {
    let session = SimulatedSession::for_model("AMU200A");
    let wire = session.clone();
    let mut driver = SmDriver::new(InstrumentModel::Amu200a);
    driver
        .initialize(Box::new(session), DriverOptions::default())
        .await
        .unwrap();
    wire.clear_transcript();

    assert!(matches!(
        driver.set_rf_frequency(1e9).await,
        Err(DriverError::CapabilityNotSupported { .. })
    ));
    assert!(matches!(
        driver.lf_frequency().await,
        Err(DriverError::CapabilityNotSupported { .. })
    ));
    assert!(wire.transcript().is_empty());

    driver.set_iq_enabled(true).await.unwrap();
    assert_eq!(wire.writes(), vec![":SOUR:IQ:STAT 1"]);
}
