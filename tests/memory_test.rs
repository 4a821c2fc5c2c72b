//! Mass memory file transfer and state memories.

use rs_siggen::driver::{DriverOptions, SmDriver};
use rs_siggen::error::DriverError;
use rs_siggen::model::InstrumentModel;
use rs_siggen::attribute::Attribute;
use rs_siggen::session::{SessionEvent, SimulatedSession};
use rs_siggen::traits::{MassMemory, RfBase};
use std::io::Write;
use std::path::Path;

async fn open() -> (SmDriver, SimulatedSession) {
    let session = SimulatedSession::for_model("SMBV100A");
    let wire = session.clone();
    let mut driver = SmDriver::new(InstrumentModel::Smbv100a);
    driver
        .initialize(Box::new(session), DriverOptions::default())
        .await
        .unwrap();
    wire.clear_transcript();
    (driver, wire)
}

#[tokio::test]
async fn delete_quotes_the_path() {
    let (mut driver, wire) = open().await;
    driver.delete_file_from_instrument("TEST.WV").await.unwrap();
    assert_eq!(wire.writes(), vec![":MMEM:DEL 'TEST.WV'"]);
}

#[tokio::test]
async fn upload_sends_block_header_then_payload() {
    let (mut driver, wire) = open().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.wv");
    let payload: Vec<u8> = (0u8..10).collect();
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&payload)
        .unwrap();

    driver
        .write_file_to_instrument(&path, "/waves/")
        .await
        .unwrap();

    assert_eq!(
        wire.transcript(),
        vec![
            SessionEvent::Write(":MMEM:DATA '/waves/ramp.wv' ,#210".to_string()),
            SessionEvent::WriteRaw(payload),
        ]
    );
}

#[tokio::test]
async fn upload_of_empty_file() {
    let (mut driver, wire) = open().await;
    let file = tempfile::NamedTempFile::new().unwrap();
    let name = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    driver
        .write_file_to_instrument(file.path(), "")
        .await
        .unwrap();
    assert_eq!(wire.writes(), vec![format!(":MMEM:DATA '{name}' ,#10")]);
}

#[tokio::test]
async fn missing_local_file_fails_before_io() {
    let (mut driver, wire) = open().await;
    let result = driver
        .write_file_to_instrument(Path::new("/nonexistent/dir/wave.wv"), "/waves/")
        .await;
    assert!(matches!(result, Err(DriverError::Io(_))));
    assert!(wire.transcript().is_empty());
}

#[tokio::test]
async fn read_file_is_never_supported() {
    let (mut driver, wire) = open().await;
    let dir = tempfile::tempdir().unwrap();

    for (source, destination) in [("TEST.WV", dir.path().join("out.wv")), ("", dir.path().to_path_buf())] {
        let result = driver.read_file_from_instrument(source, &destination).await;
        assert!(matches!(result, Err(DriverError::NotImplemented(_))));
    }
    assert!(wire.transcript().is_empty());

    // Also without any session
    let mut idle = SmDriver::new(InstrumentModel::Smw200a);
    assert!(matches!(
        idle.read_file_from_instrument("x", Path::new("y")).await,
        Err(DriverError::NotImplemented(_))
    ));
}

#[tokio::test]
async fn save_and_recall_address_state_memories() {
    let (mut driver, wire) = open().await;
    driver.save_state(3).await.unwrap();
    driver.recall_state(3).await.unwrap();
    assert_eq!(wire.writes(), vec!["*SAV 3", "*RCL 3"]);

    driver.save_state(0).await.unwrap();
    driver.recall_state(9).await.unwrap();
    assert_eq!(&wire.writes()[2..], ["*SAV 0", "*RCL 9"]);
}

#[tokio::test]
async fn out_of_range_memory_index_fails_before_io() {
    let (mut driver, wire) = open().await;
    assert_eq!(driver.profile().memory_size, 10);

    for index in [10, 11, usize::MAX] {
        assert!(matches!(
            driver.save_state(index).await,
            Err(DriverError::ValueNotSupported { ref attribute, .. }) if attribute == "memory_index"
        ));
        assert!(matches!(
            driver.recall_state(index).await,
            Err(DriverError::ValueNotSupported { .. })
        ));
    }
    assert!(wire.transcript().is_empty());
}

#[tokio::test]
async fn recall_invalidates_the_cache() {
    let (mut driver, _wire) = open().await;
    driver.set_rf_frequency(2e9).await.unwrap();
    driver.set_rf_output_enabled(true).await.unwrap();
    assert!(driver.cached(Attribute::RfFrequency).is_some());

    driver.save_state(1).await.unwrap();
    assert!(driver.cached(Attribute::RfFrequency).is_some());

    driver.recall_state(1).await.unwrap();
    for attribute in Attribute::ALL {
        assert!(driver.cached(attribute).is_none(), "{attribute} still cached");
    }
}

#[tokio::test]
async fn state_memories_need_an_open_session() {
    let mut idle = SmDriver::new(InstrumentModel::Smbv100a);
    assert!(matches!(
        idle.save_state(1).await,
        Err(DriverError::NotInitialized)
    ));
}
