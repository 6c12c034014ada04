/*!
 * Tests for the SRT codec
 */

use anyhow::Result;

use phasewai::errors::SubtitleError;
use phasewai::subtitle_processor::{CaptionRecord, SrtCodec};
use crate::common;

#[test]
fn test_readFile_withLesson_shouldParseEveryBlock() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "lesson.srt", common::LESSON_SRT)?;

    let records = SrtCodec::read_file(&path)?;

    assert_eq!(records.len(), 10);
    assert_eq!(records[5].text, "现在我们开始上色");
    assert_eq!(records[9].start, "00:00:19,500");
    Ok(())
}

#[test]
fn test_readFile_withGb18030Bytes_shouldDecode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (bytes, _, _) = encoding_rs::GB18030.encode(common::AMBIGUOUS_SRT);
    let path = temp_dir.path().join("legacy.srt");
    std::fs::write(&path, &bytes)?;

    let records = SrtCodec::read_file(&path)?;

    assert_eq!(records.len(), 4);
    assert_eq!(records[1].text, "我们画这里");
    Ok(())
}

#[test]
fn test_readFile_withBomAndCrlf_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = format!("\u{feff}{}", common::AMBIGUOUS_SRT.replace('\n', "\r\n"));
    let path = common::create_test_file(temp_dir.path(), "windows.srt", &content)?;

    let records = SrtCodec::read_file(&path)?;

    assert_eq!(records[0].index, 1);
    assert_eq!(records[0].text, "大家好");
    Ok(())
}

#[test]
fn test_readFile_withDescendingIndices_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = "2\n00:00:01,000 --> 00:00:02,000\n先画\n\n1\n00:00:03,000 --> 00:00:04,000\n再画\n";
    let path = common::create_test_file(temp_dir.path(), "bad.srt", content)?;

    let err = SrtCodec::read_file(&path).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SubtitleError>(),
        Some(SubtitleError::NonAscendingIndex { previous: 2, current: 1 })
    ));
    Ok(())
}

#[test]
fn test_decode_withInvalidBytes_shouldFail() {
    let bytes = [0xff, 0xfe, 0xfd, 0x81, 0x20, 0xff];

    let result = SrtCodec::decode(&bytes, "broken.srt");

    assert!(matches!(result, Err(SubtitleError::DecodeFailure { .. })));
}

#[test]
fn test_parse_withMalformedBlocks_shouldSkipThem() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\n好\n\nx\n00:00:02,000 --> 00:00:03,000\n坏\n\n3\nnot a time\n坏\n\n4\n00:00:04,000 --> 00:00:05,000\n也好\n";

    let records = SrtCodec::parse(content);

    assert_eq!(records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 4]);
}

#[test]
fn test_writeFile_shouldRenumberFromOneAndKeepTiming() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.srt");
    let records = vec![
        CaptionRecord::new(7, "00:00:01,000", "00:00:02,000", "Sketch the outline"),
        CaptionRecord::new(9, "00:00:03,000", "00:00:04,000", "Two\nlines"),
    ];

    SrtCodec::write_file(&records, &path)?;
    let written = std::fs::read_to_string(&path)?;

    assert_eq!(
        written,
        "1\n00:00:01,000 --> 00:00:02,000\nSketch the outline\n\n2\n00:00:03,000 --> 00:00:04,000\nTwo\nlines\n"
    );
    Ok(())
}

#[test]
fn test_readFile_withUtf16File_shouldReportDecodeFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut bytes = vec![0xfe, 0xff];
    for unit in "1\n00:00:01,000 --> 00:00:02,000\n用铅笔起稿\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    let path = temp_dir.path().join("utf16.srt");
    std::fs::write(&path, bytes)?;

    let err = SrtCodec::read_file(&path).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SubtitleError>(),
        Some(SubtitleError::DecodeFailure { .. })
    ));
    Ok(())
}
