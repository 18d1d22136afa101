//! Deterministic TriG output.
//!
//! Quads are grouped graph by graph in first-seen order, keeping the insertion
//! order inside each graph, and handed to oxigraph's TriG serializer. The same
//! quads and prefixes always produce the same bytes.

use crate::terms::PrefixMap;
use anyhow::Result;
use log::debug;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{GraphName, Quad};
use std::io::Write;

pub struct TrigWriter {
    prefixes: PrefixMap,
}

impl TrigWriter {
    pub fn new(prefixes: PrefixMap) -> Self {
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    pub fn write<W: Write>(&self, quads: &[Quad], writer: W) -> Result<W> {
        let mut serializer = RdfSerializer::from_format(RdfFormat::TriG);
        for (prefix, ns) in self.prefixes.iter() {
            serializer = serializer.with_prefix(prefix, ns)?;
        }
        let mut serializer = serializer.for_writer(writer);
        for quad in grouped(quads) {
            serializer.serialize_quad(quad)?;
        }
        Ok(serializer.finish()?)
    }

    pub fn to_trig(&self, quads: &[Quad]) -> Result<String> {
        let out = self.write(quads, Vec::new())?;
        debug!("Serialized {} quads into {} bytes of TriG", quads.len(), out.len());
        Ok(String::from_utf8(out)?)
    }
}

/// Quads reordered so each graph forms one contiguous block.
fn grouped(quads: &[Quad]) -> impl Iterator<Item = &Quad> {
    let mut graphs: Vec<&GraphName> = Vec::new();
    for quad in quads {
        if !graphs.contains(&&quad.graph_name) {
            graphs.push(&quad.graph_name);
        }
    }
    graphs
        .into_iter()
        .flat_map(move |graph| quads.iter().filter(move |q| &q.graph_name == graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RdfDocument;
    use oxigraph::model::vocab::xsd;
    use oxigraph::model::{Literal, NamedNode};

    fn nn(s: &str) -> NamedNode {
        NamedNode::new(s).unwrap()
    }

    fn prefixes() -> PrefixMap {
        [
            ("this", "https://w3id.org/np/placeholder"),
            ("sub", "https://w3id.org/np/placeholder/"),
            ("xsd", "http://www.w3.org/2001/XMLSchema#"),
            ("dcterms", "http://purl.org/dc/terms/"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_writes_prefixed_blocks_and_reparses() {
        let pubinfo = GraphName::NamedNode(nn("https://w3id.org/np/placeholder/pubinfo"));
        let quads = vec![
            Quad::new(
                nn("https://w3id.org/np/placeholder"),
                nn("http://purl.org/dc/terms/created"),
                Literal::new_typed_literal("2025-01-01T00:00:00.000Z", xsd::DATE_TIME),
                pubinfo.clone(),
            ),
            Quad::new(
                nn("https://w3id.org/np/placeholder"),
                nn("http://www.w3.org/2000/01/rdf-schema#label"),
                Literal::new_simple_literal("say \"hi\"\nthere"),
                pubinfo.clone(),
            ),
        ];
        let text = TrigWriter::new(prefixes()).to_trig(&quads).unwrap();
        assert!(text.contains("@prefix this: <https://w3id.org/np/placeholder> .\n"));
        assert!(text.contains("sub:pubinfo {\n"));
        assert!(text.contains(
            "this: dcterms:created \"2025-01-01T00:00:00.000Z\"^^xsd:dateTime"
        ));

        let reparsed = RdfDocument::parse_str(&text).unwrap();
        assert_eq!(reparsed.len(), 2);
        for quad in &quads {
            assert!(reparsed.dataset().contains(quad));
        }
    }

    #[test]
    fn test_interleaved_graphs_are_written_as_single_blocks() {
        let a = GraphName::NamedNode(nn("https://w3id.org/np/placeholder/assertion"));
        let b = GraphName::NamedNode(nn("https://w3id.org/np/placeholder/pubinfo"));
        let p = nn("http://purl.org/dc/terms/title");
        let quads = vec![
            Quad::new(nn("http://example.org/1"), p.clone(), Literal::new_simple_literal("1"), a.clone()),
            Quad::new(nn("http://example.org/2"), p.clone(), Literal::new_simple_literal("2"), b.clone()),
            Quad::new(nn("http://example.org/3"), p.clone(), Literal::new_simple_literal("3"), a.clone()),
        ];
        let text = TrigWriter::new(prefixes()).to_trig(&quads).unwrap();
        assert_eq!(text.matches("sub:assertion {").count(), 1);
        assert!(text.find("sub:assertion {").unwrap() < text.find("sub:pubinfo {").unwrap());
        assert!(text.find("<http://example.org/3>").unwrap() < text.find("sub:pubinfo {").unwrap());
    }

    #[test]
    fn test_non_ascii_local_names_stay_parseable() {
        let graph = GraphName::NamedNode(nn("https://w3id.org/np/placeholder/assertion"));
        let quads = vec![Quad::new(
            nn("https://w3id.org/np/placeholder/µm"),
            nn("http://purl.org/dc/terms/title"),
            Literal::new_simple_literal("micrometre"),
            graph,
        )];
        let text = TrigWriter::new(prefixes()).to_trig(&quads).unwrap();
        assert!(!text.contains("sub:µm"));
        let reparsed = RdfDocument::parse_str(&text).unwrap();
        assert!(reparsed.dataset().contains(&quads[0]));
    }
}
