//! Floor-plan parser: SVG markup into a [`LocationMap`].
//!
//! DESIGN
//! ======
//! Every `<g>` whose `id` starts with `kube` is a location. Inside it we look
//! for `outer-<id>` and `inner-<id>` elements (any depth) and read `x`, `y`,
//! `width`, `height` from each. A group missing either element, or carrying a
//! missing / non-numeric / non-finite coordinate, is dropped on its own: one
//! broken location must not blank out the whole plan.
//!
//! Duplicate group ids: last one in document order wins.

use roxmltree::{Document, Node, ParsingOptions};

use super::types::{LOCATION_ID_PREFIX, LocationGeometry, LocationId, LocationMap, ParseError, Rectangle};

/// Parse floor-plan markup.
///
/// # Errors
///
/// - [`ParseError::Malformed`] when the text is not well-formed markup.
/// - [`ParseError::Empty`] when it parses but yields zero locations.
pub fn parse(document: &str) -> Result<LocationMap, ParseError> {
    let doc = parse_markup(document)?;

    let mut locations = LocationMap::new();
    for group in doc.descendants().filter(is_location_group) {
        let Some(id) = group.attribute("id") else {
            continue;
        };
        let Some(geometry) = parse_group(group, id) else {
            tracing::debug!(location = id, "skipping location with incomplete geometry");
            continue;
        };
        if locations.insert(LocationId::new(id), geometry).is_some() {
            tracing::debug!(location = id, "duplicate location id; keeping the later group");
        }
    }

    if locations.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(locations)
}

/// Validate that `document` is well-formed markup without extracting anything.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] with the parser's message.
pub fn check_well_formed(document: &str) -> Result<(), ParseError> {
    parse_markup(document).map(|_| ())
}

// Editors commonly emit a DOCTYPE header, so DTDs are allowed.
fn parse_markup(document: &str) -> Result<Document<'_>, ParseError> {
    let mut opts = ParsingOptions::default();
    opts.allow_dtd = true;
    Document::parse_with_options(document, opts).map_err(|e| ParseError::Malformed(e.to_string()))
}

fn is_location_group(node: &Node<'_, '_>) -> bool {
    node.is_element()
        && node.tag_name().name() == "g"
        && node
            .attribute("id")
            .is_some_and(|id| id.starts_with(LOCATION_ID_PREFIX))
}

fn parse_group(group: Node<'_, '_>, id: &str) -> Option<LocationGeometry> {
    let outer_id = format!("outer-{id}");
    let inner_id = format!("inner-{id}");

    let outer = find_by_id(group, &outer_id)?;
    let inner = find_by_id(group, &inner_id)?;

    Some(LocationGeometry {
        outer: read_rectangle(outer)?,
        inner: read_rectangle(inner)?,
        inner_style_class: inner.attribute("class").unwrap_or_default().to_string(),
    })
}

fn find_by_id<'a, 'input>(group: Node<'a, 'input>, id: &str) -> Option<Node<'a, 'input>> {
    group
        .descendants()
        .skip(1)
        .find(|n| n.is_element() && n.attribute("id") == Some(id))
}

fn read_rectangle(node: Node<'_, '_>) -> Option<Rectangle> {
    Some(Rectangle {
        x: read_number(node, "x")?,
        y: read_number(node, "y")?,
        width: read_number(node, "width")?,
        height: read_number(node, "height")?,
    })
}

fn read_number(node: Node<'_, '_>, attr: &str) -> Option<f64> {
    node.attribute(attr)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod tests;
