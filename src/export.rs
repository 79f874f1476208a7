//! Export of lexical items to the IMS lexical sample format: one XML context file and one key file
//! per item, plus a list of the exported item keys.

use fs_err as fs;
use log::info;
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use crate::{item::LexicalItem, utils::artifact_paths, Artifact, Error};

impl From<xml::writer::Error> for Error {
    fn from(error: xml::writer::Error) -> Self {
        Error::Xml(error.to_string())
    }
}

fn indent<W: Write>(writer: &mut EventWriter<W>, level: usize) -> Result<(), Error> {
    writer.write(XmlEvent::characters(&format!("\n{}", "  ".repeat(level))))?;
    Ok(())
}

/// Writes the context of an instance, the tokens from `first` to `last` wrapped in `<head>`.
fn write_context<W: Write>(
    writer: &mut EventWriter<W>,
    tokens: &[&str],
    first: usize,
    last: usize,
) -> Result<(), Error> {
    let last = last.min(tokens.len().saturating_sub(1));
    let first = first.min(last);

    writer.write(XmlEvent::start_element("context"))?;
    if first > 0 {
        writer.write(XmlEvent::characters(&format!(
            "{} ",
            tokens[..first].join(" ")
        )))?;
    }
    if !tokens.is_empty() {
        writer.write(XmlEvent::start_element("head"))?;
        writer.write(XmlEvent::characters(&tokens[first..=last].join(" ")))?;
        writer.write(XmlEvent::end_element())?;
    }
    if last + 1 < tokens.len() {
        writer.write(XmlEvent::characters(&format!(
            " {}",
            tokens[last + 1..].join(" ")
        )))?;
    }
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

/// Writes the instances of the item in (document, id) order. The head spans from the first to the
/// last head token.
pub fn write_xml<W: Write>(item: &LexicalItem, writer: W) -> Result<(), Error> {
    // indentation is written by hand, the emitter would also indent inside mixed content
    let mut writer = EmitterConfig::new()
        .perform_indent(false)
        .create_writer(writer);

    let key = item.key();
    let pos = item.pos().to_string();

    writer.write(XmlEvent::start_element("corpus").attr("lang", "en"))?;
    indent(&mut writer, 1)?;
    writer.write(
        XmlEvent::start_element("lexelt")
            .attr("item", &key)
            .attr("pos", &pos),
    )?;

    for instance in item.sorted_instances() {
        let texts: Vec<_> = instance.tokens().iter().map(|x| x.text()).collect();
        let first = instance.heads().iter().min().copied().unwrap_or_default();
        let last = instance.heads().iter().max().copied().unwrap_or_default();

        indent(&mut writer, 2)?;
        writer.write(
            XmlEvent::start_element("instance")
                .attr("id", instance.id())
                .attr("docsrc", instance.docsrc()),
        )?;
        indent(&mut writer, 3)?;
        write_context(&mut writer, &texts, first, last)?;
        indent(&mut writer, 2)?;
        writer.write(XmlEvent::end_element())?;
    }

    indent(&mut writer, 1)?;
    writer.write(XmlEvent::end_element())?;
    indent(&mut writer, 0)?;
    writer.write(XmlEvent::end_element())?;
    writer.into_inner().write_all(b"\n")?;
    Ok(())
}

/// Writes one `item instance_id key...` line per instance, in (document, id) order.
pub fn write_key<W: Write>(item: &LexicalItem, mut writer: W) -> Result<(), Error> {
    let key = item.key();
    for instance in item.sorted_instances() {
        writeln!(writer, "{} {} {}", key, instance.id(), instance.gold().join(" "))?;
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq)]
pub struct ExportSummary {
    pub items: usize,
    pub instances: usize,
    pub word_list: PathBuf,
}

/// The word list of an export sits next to the output directory: `out/` -> `out.word_list`.
fn word_list_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|x| x.to_os_string())
        .unwrap_or_default();
    name.push(".word_list");
    output.with_file_name(name)
}

/// Exports every item artifact of `input` into `output`, which must not exist yet.
pub fn export_items<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<ExportSummary, Error> {
    let output = output.as_ref();
    if output.exists() {
        return Err(Error::OutputExists(output.to_path_buf()));
    }
    fs::create_dir_all(output)?;

    let mut summary = ExportSummary {
        word_list: word_list_path(output),
        ..ExportSummary::default()
    };
    let mut word_list = BufWriter::new(fs::File::create(&summary.word_list)?);

    for path in artifact_paths(input)? {
        let item = LexicalItem::new(&path)?;
        let key = item.key();
        info!("Exporting {} ({} instances).", key, item.len());

        let mut xml = BufWriter::new(fs::File::create(output.join(format!("{}.train.xml", key)))?);
        write_xml(&item, &mut xml)?;
        xml.flush()?;

        let mut keys = BufWriter::new(fs::File::create(output.join(format!("{}.train.key", key)))?);
        write_key(&item, &mut keys)?;
        keys.flush()?;

        writeln!(word_list, "{}", key)?;
        summary.items += 1;
        summary.instances += item.len();
    }

    word_list.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Instance, Pos, Token};

    fn item() -> LexicalItem {
        let mut item = LexicalItem::empty("bank", Pos::Noun);
        let texts = [
            ("b", vec!["the", "river", "bank"], vec![2]),
            ("a", vec!["a", "bank", "&", "co"], vec![1, 2]),
        ];
        for (id, words, heads) in texts.iter() {
            let tokens = words
                .iter()
                .enumerate()
                .map(|(i, w)| Token::new(format!("{}{}", id, i), w.to_string(), None, None))
                .collect();
            let instance = Instance::new(
                id.to_string(),
                "doc".into(),
                "bank".into(),
                Pos::Noun,
                tokens,
                heads.clone(),
            );
            item.add_instance(instance.with_gold(vec!["bank%1:17:01::", "bank%1:14:00::"]));
        }
        item
    }

    #[test]
    fn writes_contexts_with_heads() {
        let mut buffer = Vec::new();
        write_xml(&item(), &mut buffer).unwrap();
        let xml = String::from_utf8(buffer).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<lexelt item=\"bank.n\" pos=\"n\">"));
        assert!(xml.contains("<context>a <head>bank &amp;</head> co</context>"));
        assert!(xml.contains("<context>the river <head>bank</head></context>"));
        assert!(xml.find("id=\"a\"").unwrap() < xml.find("id=\"b\"").unwrap());
    }

    #[test]
    fn written_xml_parses_back() {
        let mut item = item();
        item.add_instance(Instance::new(
            "c\"1",
            "d<2>",
            "bank",
            Pos::Noun,
            vec![Token::new("c0", "bank", None, None)],
            vec![0],
        ));
        let mut buffer = Vec::new();
        write_xml(&item, &mut buffer).unwrap();
        let xml = String::from_utf8(buffer).unwrap();

        let document = roxmltree::Document::parse(&xml).unwrap();
        let instances: Vec<_> = document
            .descendants()
            .filter(|x| x.has_tag_name("instance"))
            .collect();
        assert_eq!(instances.len(), 3);
        // `d<2>` sorts before `doc`
        assert_eq!(instances[0].attribute("id"), Some("c\"1"));
        assert_eq!(instances[0].attribute("docsrc"), Some("d<2>"));

        let heads: Vec<_> = document
            .descendants()
            .filter(|x| x.has_tag_name("head"))
            .map(|x| x.text().unwrap_or_default())
            .collect();
        assert_eq!(heads, vec!["bank", "bank &", "bank"]);
    }

    #[test]
    fn writes_keys_in_order() {
        let mut buffer = Vec::new();
        write_key(&item(), &mut buffer).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "bank.n a bank%1:17:01:: bank%1:14:00::\nbank.n b bank%1:17:01:: bank%1:14:00::\n"
        );
    }

    #[test]
    fn exports_folders() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        item().save_in(input.path()).unwrap();
        let output = out.path().join("ims");

        let summary = export_items(input.path(), &output).unwrap();

        assert_eq!(summary.items, 1);
        assert_eq!(summary.instances, 2);
        assert_eq!(summary.word_list, out.path().join("ims.word_list"));
        assert_eq!(std::fs::read_to_string(&summary.word_list).unwrap(), "bank.n\n");
        assert!(output.join("bank.n.train.xml").exists());
        assert!(output.join("bank.n.train.key").exists());

        assert!(matches!(
            export_items(input.path(), &output),
            Err(Error::OutputExists(_))
        ));
    }
}
