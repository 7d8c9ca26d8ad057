//! The vector-content importer.
//!
//! Walks external SVG markup event by event, converting supported nodes
//! (`<path>`, legacy grouped-path containers) into stroke components and
//! wrapping everything else as opaque imported elements. A progress
//! callback fires after every processed node so the host can interleave
//! UI work — the cooperative analogue of awaiting between nodes.
//!
//! Untrusted input runs under a strict isolation policy: document type
//! declarations (the entity-expansion vector), `<script>` elements, and
//! script-carrying attributes abort the import, fatally, before anything
//! is inserted from them. Components reach the document through the same
//! `AddComponent` primitive the tools use, but bypass the undo history.

use crate::commands::{AddComponent, Command, EditorState};
use nib_core::component::{ComponentKind, ImportedElement, Stroke, StrokeSegment};
use nib_core::path::Path;
use nib_core::rect::Rect;
use nib_core::style::{Color, PathStyle, StrokePen};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Class marker for legacy grouped-path strokes: every `<path>` inside
/// such a `<g>` becomes one segment of a single stroke component.
const STROKE_GROUP_CLASS: &str = "stroke-group";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed vector markup: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The content tried to escape the script-disabled parsing context.
    #[error("import isolation violated: {0}")]
    IsolationViolation(String),
}

/// Progress snapshot passed to the host between nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportProgress {
    pub nodes_processed: usize,
    pub components_added: usize,
}

/// Container elements walked through without producing a component.
fn is_structural(name: &[u8]) -> bool {
    matches!(name, b"svg" | b"g" | b"defs" | b"title" | b"desc" | b"metadata" | b"style")
}

fn attr_value(tag: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Reject script vectors on any element.
fn check_isolation(tag: &BytesStart<'_>) -> Result<(), ImportError> {
    if tag.local_name().as_ref() == b"script" {
        return Err(ImportError::IsolationViolation("<script> element".to_string()));
    }
    for attr in tag.attributes().flatten() {
        let key = attr.key.as_ref();
        if key.len() > 2 && key[..2].eq_ignore_ascii_case(b"on") {
            return Err(ImportError::IsolationViolation(format!(
                "event handler attribute `{}`",
                String::from_utf8_lossy(key)
            )));
        }
        if matches!(key, b"href" | b"xlink:href")
            && attr
                .unescape_value()
                .map(|v| v.trim_start().to_ascii_lowercase().starts_with("javascript:"))
                .unwrap_or(false)
        {
            return Err(ImportError::IsolationViolation("javascript: reference".to_string()));
        }
    }
    Ok(())
}

/// Paint style from presentation attributes, defaulting to a black fill.
fn style_from_attrs(tag: &BytesStart<'_>) -> PathStyle {
    let fill = attr_value(tag, b"fill")
        .and_then(|v| Color::from_css(&v))
        .unwrap_or(Color::BLACK);
    let stroke = attr_value(tag, b"stroke")
        .and_then(|v| Color::from_css(&v))
        .filter(|c| c.a > 0.0)
        .map(|color| StrokePen {
            color,
            width: attr_value(tag, b"stroke-width")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(1.0),
        });
    PathStyle { fill, stroke }
}

/// Declared bounds of an unsupported element, when it carries any.
fn declared_bbox(tag: &BytesStart<'_>) -> Rect {
    let get = |name: &[u8]| {
        attr_value(tag, name)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    Rect::new(get(b"x"), get(b"y"), get(b"width"), get(b"height"))
}

/// Import SVG markup into the document. Returns the number of components
/// added. `on_progress` is invoked after every processed node.
pub fn import_svg(
    state: &mut EditorState,
    source: &str,
    mut on_progress: impl FnMut(&ImportProgress),
) -> Result<usize, ImportError> {
    let mut reader = Reader::from_str(source);
    let mut progress = ImportProgress::default();
    // Segments of the stroke-group currently being collected, if any.
    let mut group_segments: Option<Vec<StrokeSegment>> = None;

    let mut add_component = |state: &mut EditorState, kind: ComponentKind| {
        let component = state.document.create_component(kind);
        let mut command = AddComponent::new(component);
        command.apply(state);
    };

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Eof => break,
            Event::DocType(_) => {
                return Err(ImportError::IsolationViolation(
                    "document type declaration".to_string(),
                ));
            }
            Event::Start(tag) => {
                check_isolation(&tag)?;
                let name = tag.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"g" => {
                        let is_stroke_group = attr_value(&tag, b"class")
                            .is_some_and(|c| c.contains(STROKE_GROUP_CLASS));
                        if is_stroke_group && group_segments.is_none() {
                            group_segments = Some(Vec::new());
                        }
                    }
                    b"path" => {
                        import_path(&tag, state, &mut group_segments, &mut progress, &mut add_component);
                    }
                    other if is_structural(other) => {}
                    _ => {
                        // Unsupported container: capture its whole span as
                        // one opaque element and skip its children.
                        let end = tag.to_end().into_owned();
                        reader.read_to_end(end.name())?;
                        let markup = source[before..reader.buffer_position() as usize].to_string();
                        add_component(
                            state,
                            ComponentKind::Imported(ImportedElement::new(markup, declared_bbox(&tag))),
                        );
                        progress.components_added += 1;
                    }
                }
                progress.nodes_processed += 1;
                on_progress(&progress);
            }
            Event::Empty(tag) => {
                check_isolation(&tag)?;
                match tag.local_name().as_ref() {
                    b"path" => {
                        import_path(&tag, state, &mut group_segments, &mut progress, &mut add_component);
                    }
                    other if is_structural(other) => {}
                    _ => {
                        let markup = source[before..reader.buffer_position() as usize].to_string();
                        add_component(
                            state,
                            ComponentKind::Imported(ImportedElement::new(markup, declared_bbox(&tag))),
                        );
                        progress.components_added += 1;
                    }
                }
                progress.nodes_processed += 1;
                on_progress(&progress);
            }
            Event::End(tag) => {
                if tag.local_name().as_ref() == b"g"
                    && let Some(segments) = group_segments.take()
                {
                    if !segments.is_empty() {
                        add_component(state, ComponentKind::Stroke(Stroke::new(segments)));
                        progress.components_added += 1;
                    }
                    on_progress(&progress);
                }
            }
            _ => {}
        }
    }

    state.request_repaint();
    Ok(progress.components_added)
}

/// Convert one `<path>` element: into the open stroke group, or into a
/// fresh single-segment stroke component. Malformed path data falls back
/// to an opaque element rather than failing the whole import.
fn import_path(
    tag: &BytesStart<'_>,
    state: &mut EditorState,
    group_segments: &mut Option<Vec<StrokeSegment>>,
    progress: &mut ImportProgress,
    add_component: &mut impl FnMut(&mut EditorState, ComponentKind),
) {
    let Some(d) = attr_value(tag, b"d") else {
        log::warn!("skipping <path> without d attribute");
        return;
    };
    let style = style_from_attrs(tag);
    match d.parse::<Path>() {
        Ok(path) => {
            let segment = StrokeSegment::new(path, style);
            match group_segments {
                Some(segments) => segments.push(segment),
                None => {
                    add_component(state, ComponentKind::Stroke(Stroke::new(vec![segment])));
                    progress.components_added += 1;
                }
            }
        }
        Err(err) => {
            log::warn!("unparseable path data treated as opaque element: {err}");
            let markup = format!("<path d=\"{d}\"/>");
            add_component(
                state,
                ComponentKind::Imported(ImportedElement::new(markup, Rect::EMPTY)),
            );
            progress.components_added += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nib_core::rect::Rect;

    fn state() -> EditorState {
        EditorState::new(Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    #[test]
    fn imports_paths_as_strokes() {
        let mut state = state();
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg">
            <path d="M0,0 L10,0 L10,10 Z" fill="#FF0000"/>
            <path d="M20,20 Q25,15 30,20" fill="none" stroke="#000000" stroke-width="2"/>
        </svg>"##;

        let added = import_svg(&mut state, svg, |_| {}).unwrap();
        assert_eq!(added, 2);
        assert_eq!(state.document.component_count(), 2);
        assert!(state.document.is_consistent());
    }

    #[test]
    fn progress_fires_per_node() {
        let mut state = state();
        let svg = r#"<svg><path d="M0,0 L1,1"/><path d="M2,2 L3,3"/></svg>"#;
        let mut calls = 0;
        import_svg(&mut state, svg, |_| calls += 1).unwrap();
        // svg + two paths.
        assert_eq!(calls, 3);
    }

    #[test]
    fn stroke_group_merges_into_one_component() {
        let mut state = state();
        let svg = r#"<svg>
            <g class="stroke-group">
                <path d="M0,0 L5,0"/>
                <path d="M5,0 L5,5"/>
            </g>
        </svg>"#;
        let added = import_svg(&mut state, svg, |_| {}).unwrap();
        assert_eq!(added, 1);

        let id = state.document.component_ids().next().unwrap();
        match state.document.get(id).unwrap().kind() {
            ComponentKind::Stroke(stroke) => assert_eq!(stroke.segments.len(), 2),
            _ => panic!("expected a stroke"),
        }
    }

    #[test]
    fn unsupported_elements_become_opaque() {
        let mut state = state();
        let svg = r#"<svg><image x="5" y="5" width="20" height="10" href="a.png"/></svg>"#;
        let added = import_svg(&mut state, svg, |_| {}).unwrap();
        assert_eq!(added, 1);

        let id = state.document.component_ids().next().unwrap();
        let component = state.document.get(id).unwrap();
        match component.kind() {
            ComponentKind::Imported(elem) => {
                assert!(elem.markup.contains("image"));
            }
            _ => panic!("expected an imported element"),
        }
        assert!(component.bbox().eq_approx(&Rect::new(5.0, 5.0, 20.0, 10.0), 1e-9));
    }

    #[test]
    fn doctype_aborts_import() {
        let mut state = state();
        let svg = r#"<!DOCTYPE svg [<!ENTITY x "boom">]><svg><path d="M0,0 L1,1"/></svg>"#;
        let err = import_svg(&mut state, svg, |_| {}).unwrap_err();
        assert!(matches!(err, ImportError::IsolationViolation(_)));
        assert_eq!(state.document.component_count(), 0);
    }

    #[test]
    fn script_elements_abort_import() {
        let mut state = state();
        let svg = r#"<svg><script>alert(1)</script></svg>"#;
        assert!(matches!(
            import_svg(&mut state, svg, |_| {}),
            Err(ImportError::IsolationViolation(_))
        ));
    }

    #[test]
    fn event_handler_attributes_abort_import() {
        let mut state = state();
        let svg = r#"<svg><path d="M0,0 L1,1" onclick="alert(1)"/></svg>"#;
        assert!(matches!(
            import_svg(&mut state, svg, |_| {}),
            Err(ImportError::IsolationViolation(_))
        ));
    }

    #[test]
    fn malformed_path_data_is_preserved_opaquely() {
        let mut state = state();
        // A is unsupported in the mini-language.
        let svg = r#"<svg><path d="M0,0 A5,5 0 0 1 10,10"/></svg>"#;
        let added = import_svg(&mut state, svg, |_| {}).unwrap();
        assert_eq!(added, 1);
        let id = state.document.component_ids().next().unwrap();
        assert!(matches!(
            state.document.get(id).unwrap().kind(),
            ComponentKind::Imported(_)
        ));
    }
}
