/*!
 * Tests for glossary files
 */

use anyhow::Result;

use phasewai::glossary::{Glossary, GlossaryEntry};
use crate::common;

#[test]
fn test_fromFile_withLessonGlossary_shouldLoadAndRender() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "glossary.csv",
        "Chinese,English,Category,Notes\n留白,leave white space,Techniques,keep the paper white\n群青,ultramarine,Pigments,\n",
    )?;

    let glossary = Glossary::from_file(&path)?;
    let text = glossary.render();

    assert_eq!(glossary.len(), 2);
    assert!(text.contains("### Techniques\n- 留白 -> leave white space  (keep the paper white)"));
    assert!(text.contains("### Pigments\n- 群青 -> ultramarine"));
    Ok(())
}

#[test]
fn test_fromFile_withQuotedCommas_shouldKeepThemInFields() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "glossary.csv",
        "chinese,english,notes\n湿画法,\"wet-on-wet, wet-in-wet\",\"apply on damp paper\"\n",
    )?;

    let glossary = Glossary::from_file(&path)?;

    assert_eq!(glossary.entries()[0].target_term, "wet-on-wet, wet-in-wet");
    assert!(glossary.render().contains("### General"));
    Ok(())
}

#[test]
fn test_fromFile_withMissingFile_shouldFail() {
    assert!(Glossary::from_file("/nonexistent/glossary.csv").is_err());
}

#[test]
fn test_render_withBuiltEntries_shouldMatchLoadedFile() -> Result<()> {
    let built = Glossary::new(vec![
        GlossaryEntry::new("留白", "leave white space")
            .with_category("Techniques")
            .with_notes("keep the paper white"),
    ]);
    let loaded = Glossary::from_reader(
        "Chinese,English,Category,Notes\n留白,leave white space,Techniques,keep the paper white\n".as_bytes(),
    )?;

    assert_eq!(built, loaded);
    assert_eq!(built.render(), loaded.render());
    Ok(())
}
