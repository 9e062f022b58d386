//! Foreign-content (SVG and MathML) adjustment tables.
//!
//! Inside foreign content the HTML tokenizer still lowercases names, so
//! camel-cased SVG tag and attribute names must be corrected afterward, and
//! the `xlink:*`, `xml:*`, and `xmlns` attributes move into their proper
//! namespaces.
//!
//! @see https://html.spec.whatwg.org/#adjust-svg-attributes
//! @see https://html.spec.whatwg.org/#adjust-foreign-attributes

use crate::signal::{
    Attribute, Name, XLINK_NAMESPACE, XMLNS_NAMESPACE, XML_NAMESPACE,
};

/// Corrects a lowercased SVG tag name to its mixed-case form.
///
/// > If the token's tag name is one of the ones in the first column of the
/// > following table, change the tag name to the name given in the
/// > corresponding cell in the second column.
pub(crate) fn adjust_svg_tag_name(lower: &str) -> &str {
    match lower {
        "altglyph" => "altGlyph",
        "altglyphdef" => "altGlyphDef",
        "altglyphitem" => "altGlyphItem",
        "animatecolor" => "animateColor",
        "animatemotion" => "animateMotion",
        "animatetransform" => "animateTransform",
        "clippath" => "clipPath",
        "feblend" => "feBlend",
        "fecolormatrix" => "feColorMatrix",
        "fecomponenttransfer" => "feComponentTransfer",
        "fecomposite" => "feComposite",
        "feconvolvematrix" => "feConvolveMatrix",
        "fediffuselighting" => "feDiffuseLighting",
        "fedisplacementmap" => "feDisplacementMap",
        "fedistantlight" => "feDistantLight",
        "fedropshadow" => "feDropShadow",
        "feflood" => "feFlood",
        "fefunca" => "feFuncA",
        "fefuncb" => "feFuncB",
        "fefuncg" => "feFuncG",
        "fefuncr" => "feFuncR",
        "fegaussianblur" => "feGaussianBlur",
        "feimage" => "feImage",
        "femerge" => "feMerge",
        "femergenode" => "feMergeNode",
        "femorphology" => "feMorphology",
        "feoffset" => "feOffset",
        "fepointlight" => "fePointLight",
        "fespecularlighting" => "feSpecularLighting",
        "fespotlight" => "feSpotLight",
        "fetile" => "feTile",
        "feturbulence" => "feTurbulence",
        "foreignobject" => "foreignObject",
        "glyphref" => "glyphRef",
        "lineargradient" => "linearGradient",
        "radialgradient" => "radialGradient",
        "textpath" => "textPath",
        _ => lower,
    }
}

/// Corrects a lowercased SVG attribute name to its mixed-case form.
pub(crate) fn adjust_svg_attribute_name(lower: &str) -> &str {
    match lower {
        "attributename" => "attributeName",
        "attributetype" => "attributeType",
        "basefrequency" => "baseFrequency",
        "baseprofile" => "baseProfile",
        "calcmode" => "calcMode",
        "clippathunits" => "clipPathUnits",
        "diffuseconstant" => "diffuseConstant",
        "edgemode" => "edgeMode",
        "filterunits" => "filterUnits",
        "glyphref" => "glyphRef",
        "gradienttransform" => "gradientTransform",
        "gradientunits" => "gradientUnits",
        "kernelmatrix" => "kernelMatrix",
        "kernelunitlength" => "kernelUnitLength",
        "keypoints" => "keyPoints",
        "keysplines" => "keySplines",
        "keytimes" => "keyTimes",
        "lengthadjust" => "lengthAdjust",
        "limitingconeangle" => "limitingConeAngle",
        "markerheight" => "markerHeight",
        "markerunits" => "markerUnits",
        "markerwidth" => "markerWidth",
        "maskcontentunits" => "maskContentUnits",
        "maskunits" => "maskUnits",
        "numoctaves" => "numOctaves",
        "pathlength" => "pathLength",
        "patterncontentunits" => "patternContentUnits",
        "patterntransform" => "patternTransform",
        "patternunits" => "patternUnits",
        "pointsatx" => "pointsAtX",
        "pointsaty" => "pointsAtY",
        "pointsatz" => "pointsAtZ",
        "preservealpha" => "preserveAlpha",
        "preserveaspectratio" => "preserveAspectRatio",
        "primitiveunits" => "primitiveUnits",
        "refx" => "refX",
        "refy" => "refY",
        "repeatcount" => "repeatCount",
        "repeatdur" => "repeatDur",
        "requiredextensions" => "requiredExtensions",
        "requiredfeatures" => "requiredFeatures",
        "specularconstant" => "specularConstant",
        "specularexponent" => "specularExponent",
        "spreadmethod" => "spreadMethod",
        "startoffset" => "startOffset",
        "stddeviation" => "stdDeviation",
        "stitchtiles" => "stitchTiles",
        "surfacescale" => "surfaceScale",
        "systemlanguage" => "systemLanguage",
        "tablevalues" => "tableValues",
        "targetx" => "targetX",
        "targety" => "targetY",
        "textlength" => "textLength",
        "viewbox" => "viewBox",
        "viewtarget" => "viewTarget",
        "xchannelselector" => "xChannelSelector",
        "ychannelselector" => "yChannelSelector",
        "zoomandpan" => "zoomAndPan",
        _ => lower,
    }
}

/// Splits the `xlink:*`, `xml:*`, and `xmlns*` attributes into namespaced
/// names; everything else passes through unchanged.
///
/// > When the steps below require the user agent to adjust foreign
/// > attributes for a token, … if one of the attributes on the token
/// > matches the strings given in the first column of the following table,
/// > let the attribute be a namespaced attribute.
pub(crate) fn adjust_foreign_attribute(name: &str) -> Option<(&'static str, &str)> {
    match name {
        "xlink:actuate" => Some((XLINK_NAMESPACE, "actuate")),
        "xlink:arcrole" => Some((XLINK_NAMESPACE, "arcrole")),
        "xlink:href" => Some((XLINK_NAMESPACE, "href")),
        "xlink:role" => Some((XLINK_NAMESPACE, "role")),
        "xlink:show" => Some((XLINK_NAMESPACE, "show")),
        "xlink:title" => Some((XLINK_NAMESPACE, "title")),
        "xlink:type" => Some((XLINK_NAMESPACE, "type")),
        "xml:lang" => Some((XML_NAMESPACE, "lang")),
        "xml:space" => Some((XML_NAMESPACE, "space")),
        "xmlns" => Some((XMLNS_NAMESPACE, "xmlns")),
        "xmlns:xlink" => Some((XMLNS_NAMESPACE, "xlink")),
        _ => None,
    }
}

/// Applies the per-namespace attribute adjustments to a tokenized
/// attribute list, in place.
pub(crate) fn adjust_attributes(attributes: &mut [Attribute], ns: &str) {
    for attribute in attributes.iter_mut() {
        if let Some((ns_uri, local)) = adjust_foreign_attribute(&attribute.name.local) {
            attribute.name = Name {
                ns: Some(ns_uri.into()),
                local: local.into(),
            };
            continue;
        }

        let adjusted = match ns {
            crate::signal::SVG_NAMESPACE => adjust_svg_attribute_name(&attribute.name.local),
            crate::signal::MATHML_NAMESPACE if &*attribute.name.local == "definitionurl" => {
                "definitionURL"
            }
            _ => continue,
        };
        if adjusted != &*attribute.name.local {
            attribute.name = Name {
                ns: None,
                local: adjusted.into(),
            };
        }
    }
}

/// Start tags that break out of foreign content back into HTML.
///
/// > If the token's tag name is one of the ones in the following list, …
/// > pop elements from the stack of open elements until the current node
/// > is a MathML text integration point, an HTML integration point, or an
/// > element in the HTML namespace.
pub(crate) fn is_breakout_tag(name: &str, attributes: &[Attribute]) -> bool {
    match name {
        "b" | "big" | "blockquote" | "body" | "br" | "center" | "code" | "dd" | "div" | "dl"
        | "dt" | "em" | "embed" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head" | "hr"
        | "i" | "img" | "li" | "listing" | "menu" | "meta" | "nobr" | "ol" | "p" | "pre"
        | "ruby" | "s" | "small" | "span" | "strong" | "strike" | "sub" | "sup" | "table"
        | "tt" | "u" | "ul" | "var" => true,
        "font" => attributes.iter().any(|a| {
            matches!(&*a.name.local, "color" | "face" | "size")
        }),
        _ => false,
    }
}

/// > A MathML text integration point is one of: mi, mo, mn, ms, mtext (in
/// > the MathML namespace).
pub(crate) fn is_mathml_text_integration_point(name: &Name) -> bool {
    name.is_mathml() && matches!(&*name.local, "mi" | "mo" | "mn" | "ms" | "mtext")
}

/// > An HTML integration point is an SVG foreignObject, desc, or title
/// > element, or a MathML annotation-xml whose encoding attribute is
/// > "text/html" or "application/xhtml+xml".
pub(crate) fn is_html_integration_point(name: &Name, attributes: &[Attribute]) -> bool {
    if name.is_svg() {
        return matches!(&*name.local, "foreignObject" | "desc" | "title");
    }
    if name.is_mathml() && &*name.local == "annotation-xml" {
        return attributes.iter().any(|a| {
            &*a.name.local == "encoding"
                && (a.value.eq_ignore_ascii_case("text/html")
                    || a.value.eq_ignore_ascii_case("application/xhtml+xml"))
        });
    }
    false
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal::SVG_NAMESPACE;

    #[test]
    fn svg_tag_names_are_case_corrected() {
        assert_eq!(adjust_svg_tag_name("foreignobject"), "foreignObject");
        assert_eq!(adjust_svg_tag_name("lineargradient"), "linearGradient");
        assert_eq!(adjust_svg_tag_name("circle"), "circle");
    }

    #[test]
    fn svg_attributes_are_case_corrected() {
        let mut attributes = vec![Attribute::new(Name::local("viewbox"), "0 0 1 1")];
        adjust_attributes(&mut attributes, SVG_NAMESPACE);
        assert_eq!(&*attributes[0].name.local, "viewBox");
    }

    #[test]
    fn xlink_attributes_gain_a_namespace() {
        let mut attributes = vec![Attribute::new(Name::local("xlink:href"), "#x")];
        adjust_attributes(&mut attributes, SVG_NAMESPACE);
        assert_eq!(&*attributes[0].name.local, "href");
        assert_eq!(
            attributes[0].name.ns.as_deref(),
            Some(crate::signal::XLINK_NAMESPACE)
        );
    }

    #[test]
    fn font_breaks_out_only_with_styling_attributes() {
        assert!(is_breakout_tag("p", &[]));
        assert!(!is_breakout_tag("font", &[]));
        assert!(is_breakout_tag(
            "font",
            &[Attribute::new(Name::local("color"), "red")]
        ));
        assert!(!is_breakout_tag(
            "font",
            &[Attribute::new(Name::local("family"), "serif")]
        ));
    }
}
