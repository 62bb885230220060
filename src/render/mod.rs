//! HTML renderer.
//!
//! Walks the validated document and emits the final email HTML. The body is
//! rendered first into its own buffer because the head needs to know which
//! responsive column classes the body uses; the full document is then
//! assembled around it. Rendering performs no I/O and is deterministic:
//! identical document and options produce byte-identical output.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::document::{Child, Document, ElementKind, Node};
use crate::options::RenderOptions;

mod tag;

use tag::{Tag, escape_html};

/// Output of a render pass: the HTML plus metadata captured from the head.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub content: String,
    pub title: Option<String>,
    pub preview: Option<String>,
}

const DOCTYPE: &str = "<!doctype html>";
const COND_START: &str = "<!--[if mso | IE]>";
const COND_END: &str = "<![endif]-->";

/// Reference width of the email canvas, in pixels.
const BODY_WIDTH: f64 = 600.0;

const DEFAULT_FONT: &str = "Ubuntu, Helvetica, Arial, sans-serif";
const DEFAULT_ICON_ORIGIN: &str = "https://www.mailjet.com/images/theme/v1/icons/ico-social/";

/// Nominal content width inside a single padded column, used when an image
/// or divider gives no explicit width.
const DEFAULT_CONTENT_WIDTH: &str = "550px";

const BASE_STYLE: &str = "#outlook a { padding:0; }\
body { margin:0;padding:0;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%; }\
table, td { border-collapse:collapse;mso-table-lspace:0pt;mso-table-rspace:0pt; }\
img { border:0;height:auto;line-height:100%;outline:none;text-decoration:none;-ms-interpolation-mode:bicubic; }\
p { display:block;margin:13px 0; }";

pub(crate) fn render_document(document: &Document, options: &RenderOptions) -> Rendered {
    let title = document.title();
    let preview = document.preview();

    let mut ctx = BodyCtx {
        options,
        out: String::new(),
        column_classes: BTreeMap::new(),
    };
    if let Some(body) = document.body() {
        render_body_children(body, &mut ctx);
    }

    let mut out = String::with_capacity(ctx.out.len() + 4096);
    out.push_str(DOCTYPE);
    Tag::new("html")
        .maybe_attr("lang", document.root.attribute("lang"))
        .attr("xmlns", "http://www.w3.org/1999/xhtml")
        .attr("xmlns:v", "urn:schemas-microsoft-com:vml")
        .attr("xmlns:o", "urn:schemas-microsoft-com:office:office")
        .open(&mut out);

    render_head(&mut out, title.as_deref(), &ctx.column_classes);
    render_body(&mut out, document, preview.as_deref(), &ctx.out);

    out.push_str("</html>");

    Rendered {
        content: out,
        title,
        preview,
    }
}

fn render_head(out: &mut String, title: Option<&str>, classes: &BTreeMap<String, String>) {
    out.push_str("<head>");
    write!(out, "<title>{}</title>", escape_html(title.unwrap_or(""))).unwrap();
    out.push_str(
        "<!--[if !mso]><!--><meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\"><!--<![endif]-->",
    );
    out.push_str("<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    write!(out, "<style type=\"text/css\">{BASE_STYLE}</style>").unwrap();
    out.push_str(
        "<!--[if mso]><noscript><xml><o:OfficeDocumentSettings><o:AllowPNG/>\
         <o:PixelsPerInch>96</o:PixelsPerInch></o:OfficeDocumentSettings></xml></noscript><![endif]-->",
    );
    if !classes.is_empty() {
        out.push_str("<style type=\"text/css\">@media only screen and (min-width:480px) { ");
        for (class, width) in classes {
            write!(
                out,
                ".{class} {{ width:{width} !important; max-width:{width}; }} "
            )
            .unwrap();
        }
        out.push_str("}</style>");
    }
    out.push_str("</head>");
}

fn render_body(out: &mut String, document: &Document, preview: Option<&str>, inner: &str) {
    let body_tag = Tag::new("body").style("word-spacing", "normal");
    let body_tag = match document.body().and_then(|b| b.attribute("background-color")) {
        Some(color) => body_tag.style("background-color", color),
        None => body_tag,
    };
    body_tag.open(out);

    if let Some(preview) = preview {
        write!(
            out,
            "<div style=\"display:none;font-size:1px;color:#ffffff;line-height:1px;\
             max-height:0px;max-width:0px;opacity:0;overflow:hidden;\">{preview}</div>"
        )
        .unwrap();
    }

    let wrapper = Tag::new("div").maybe_style(
        "background-color",
        document.body().and_then(|b| b.attribute("background-color")),
    );
    wrapper.open(out);
    out.push_str(inner);
    wrapper.close(out);

    out.push_str("</body>");
}

struct BodyCtx<'a> {
    options: &'a RenderOptions,
    out: String,
    /// Responsive column class name -> CSS width, collected for the head.
    column_classes: BTreeMap<String, String>,
}

impl BodyCtx<'_> {
    fn comment(&mut self, text: &str) {
        if !self.options.disable_comments() {
            write!(self.out, "<!--{text}-->").unwrap();
        }
    }
}

fn render_body_children(body: &Node, ctx: &mut BodyCtx) {
    for child in &body.children {
        match child {
            Child::Element(node) if node.kind == ElementKind::Section => {
                render_section(node, ctx);
            }
            Child::Comment(text) => ctx.comment(text),
            _ => {}
        }
    }
}

fn render_section(node: &Node, ctx: &mut BodyCtx) {
    let background = node.attribute("background-color");
    let padding = node.attribute("padding").unwrap_or("20px 0");
    let direction = node.attribute("direction").unwrap_or("ltr");
    let text_align = node.attribute("text-align").unwrap_or("center");

    // Outlook needs a real table to honor the fixed width.
    ctx.out.push_str(COND_START);
    write!(
        ctx.out,
        "<table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" \
         role=\"presentation\" style=\"width:600px;\" width=\"600\"><tr>\
         <td style=\"line-height:0px;font-size:0px;mso-line-height-rule:exactly;\">"
    )
    .unwrap();
    ctx.out.push_str(COND_END);

    Tag::new("div")
        .maybe_attr("class", node.attribute("css-class"))
        .style("margin", "0px auto")
        .style("max-width", "600px")
        .maybe_style("background", background)
        .open(&mut ctx.out);
    Tag::new("table")
        .attr("align", "center")
        .attr("border", "0")
        .attr("cellpadding", "0")
        .attr("cellspacing", "0")
        .attr("role", "presentation")
        .style("width", "100%")
        .maybe_style("background", background)
        .open(&mut ctx.out);
    ctx.out.push_str("<tbody><tr>");
    Tag::new("td")
        .style("direction", direction)
        .style("font-size", "0px")
        .style("padding", padding)
        .style("text-align", text_align)
        .open(&mut ctx.out);

    ctx.out.push_str(COND_START);
    ctx.out.push_str(
        "<table role=\"presentation\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\"><tr>",
    );
    ctx.out.push_str(COND_END);

    let columns = node
        .child_elements()
        .filter(|child| child.kind == ElementKind::Column)
        .count();
    for child in &node.children {
        match child {
            Child::Element(column) if column.kind == ElementKind::Column => {
                render_column(column, ctx, columns);
            }
            Child::Comment(text) => ctx.comment(text),
            _ => {}
        }
    }

    ctx.out.push_str(COND_START);
    ctx.out.push_str("</tr></table>");
    ctx.out.push_str(COND_END);

    ctx.out.push_str("</td></tr></tbody></table></div>");

    ctx.out.push_str(COND_START);
    ctx.out.push_str("</td></tr></table>");
    ctx.out.push_str(COND_END);
}

/// Computed width of a column within its section.
enum ColumnWidth {
    Percent(f64),
    Pixel(f64),
}

impl ColumnWidth {
    /// Explicit `width` attribute wins; otherwise columns share the section
    /// evenly.
    fn from_attribute(value: Option<&str>, siblings: usize) -> Self {
        if let Some(value) = value {
            if let Some(percent) = value.strip_suffix('%')
                && let Ok(percent) = percent.trim().parse::<f64>()
            {
                return Self::Percent(percent);
            }
            if let Some(pixels) = value.strip_suffix("px")
                && let Ok(pixels) = pixels.trim().parse::<f64>()
            {
                return Self::Pixel(pixels);
            }
        }
        Self::Percent(100.0 / siblings.max(1) as f64)
    }

    fn class_name(&self) -> String {
        match self {
            Self::Percent(p) => format!("mj-column-per-{}", fmt_number(*p).replace('.', "-")),
            Self::Pixel(px) => format!("mj-column-px-{}", fmt_number(*px).replace('.', "-")),
        }
    }

    fn css_width(&self) -> String {
        match self {
            Self::Percent(p) => format!("{}%", fmt_number(*p)),
            Self::Pixel(px) => format!("{}px", fmt_number(*px)),
        }
    }

    /// Fixed pixel width for the Outlook fallback cell.
    fn outlook_width(&self) -> String {
        match self {
            Self::Percent(p) => format!("{}px", fmt_number(BODY_WIDTH * p / 100.0)),
            Self::Pixel(px) => format!("{}px", fmt_number(*px)),
        }
    }
}

/// Format a number without trailing zeros (`50`, `33.33`, `62.5`).
fn fmt_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.2}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

fn render_column(node: &Node, ctx: &mut BodyCtx, siblings: usize) {
    let width = ColumnWidth::from_attribute(node.attribute("width"), siblings);
    let class = width.class_name();
    ctx.column_classes.insert(class.clone(), width.css_width());

    let vertical_align = node.attribute("vertical-align").unwrap_or("top");

    ctx.out.push_str(COND_START);
    write!(
        ctx.out,
        "<td class=\"\" style=\"vertical-align:{};width:{};\">",
        vertical_align,
        width.outlook_width()
    )
    .unwrap();
    ctx.out.push_str(COND_END);

    let mut classes = format!("{class} mj-outlook-group-fix");
    if let Some(extra) = node.attribute("css-class") {
        write!(classes, " {extra}").unwrap();
    }
    Tag::new("div")
        .attr("class", classes)
        .style("font-size", "0px")
        .style("text-align", "left")
        .style("direction", "ltr")
        .style("display", "inline-block")
        .style("vertical-align", vertical_align)
        .style("width", "100%")
        .open(&mut ctx.out);
    Tag::new("table")
        .attr("border", "0")
        .attr("cellpadding", "0")
        .attr("cellspacing", "0")
        .attr("role", "presentation")
        .attr("width", "100%")
        .maybe_style("background-color", node.attribute("background-color"))
        .style("vertical-align", vertical_align)
        .open(&mut ctx.out);
    ctx.out.push_str("<tbody>");

    for child in &node.children {
        match child {
            Child::Element(element) => render_column_child(element, ctx),
            Child::Comment(text) => ctx.comment(text),
            _ => {}
        }
    }

    ctx.out.push_str("</tbody></table></div>");

    ctx.out.push_str(COND_START);
    ctx.out.push_str("</td>");
    ctx.out.push_str(COND_END);
}

fn render_column_child(node: &Node, ctx: &mut BodyCtx) {
    match node.kind {
        ElementKind::Text => render_text(node, ctx),
        ElementKind::Image => render_image(node, ctx),
        ElementKind::Button => render_button(node, ctx),
        ElementKind::Divider => render_divider(node, ctx),
        ElementKind::Spacer => render_spacer(node, ctx),
        ElementKind::Social => render_social(node, ctx),
        _ => {}
    }
}

/// Open the standard `<tr><td>` block wrapping one body element.
fn open_block(node: &Node, ctx: &mut BodyCtx, align: Option<&str>, padding: &str) {
    ctx.out.push_str("<tr>");
    Tag::new("td")
        .maybe_attr("align", align)
        .maybe_attr("class", node.attribute("css-class"))
        .maybe_style(
            "background",
            node.attribute("container-background-color"),
        )
        .style("font-size", "0px")
        .style("padding", node.attribute("padding").unwrap_or(padding))
        .style("word-break", "break-word")
        .open(&mut ctx.out);
}

fn close_block(ctx: &mut BodyCtx) {
    ctx.out.push_str("</td></tr>");
}

fn render_text(node: &Node, ctx: &mut BodyCtx) {
    let align = node.attribute("align").unwrap_or("left");
    open_block(node, ctx, Some(align), "10px 25px");
    Tag::new("div")
        .style("font-family", node.attribute("font-family").unwrap_or(DEFAULT_FONT))
        .style("font-size", node.attribute("font-size").unwrap_or("13px"))
        .maybe_style("font-style", node.attribute("font-style"))
        .maybe_style("font-weight", node.attribute("font-weight"))
        .maybe_style("letter-spacing", node.attribute("letter-spacing"))
        .style("line-height", node.attribute("line-height").unwrap_or("1"))
        .style("text-align", align)
        .style("color", node.attribute("color").unwrap_or("#000000"))
        .open(&mut ctx.out);
    ctx.out.push_str(&node.text_content());
    ctx.out.push_str("</div>");
    close_block(ctx);
}

fn render_image(node: &Node, ctx: &mut BodyCtx) {
    let align = node.attribute("align").unwrap_or("center");
    open_block(node, ctx, Some(align), "10px 25px");

    ctx.out.push_str(
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" \
         style=\"border-collapse:collapse;border-spacing:0px;\"><tbody><tr>",
    );
    let cell_width = node.attribute("width").unwrap_or(DEFAULT_CONTENT_WIDTH);
    write!(ctx.out, "<td style=\"width:{cell_width};\">").unwrap();

    let link = node.attribute("href").map(|href| {
        Tag::new("a")
            .attr("href", href)
            .attr("target", node.attribute("target").unwrap_or("_blank"))
            .maybe_attr("rel", node.attribute("rel"))
    });
    if let Some(link) = &link {
        link.open(&mut ctx.out);
    }

    Tag::new("img")
        .attr("alt", node.attribute("alt").unwrap_or(""))
        .maybe_attr("height", node.attribute("height"))
        .attr("src", node.attribute("src").unwrap_or(""))
        .maybe_attr("srcset", node.attribute("srcset"))
        .maybe_attr("title", node.attribute("title"))
        .style("border", node.attribute("border").unwrap_or("0"))
        .maybe_style("border-radius", node.attribute("border-radius"))
        .style("display", "block")
        .style("outline", "none")
        .style("text-decoration", "none")
        .style("height", node.attribute("height").unwrap_or("auto"))
        .style("width", "100%")
        .style("font-size", "13px")
        .attr("width", cell_width.trim_end_matches("px"))
        .closed(&mut ctx.out);

    if let Some(link) = &link {
        link.close(&mut ctx.out);
    }

    ctx.out.push_str("</td></tr></tbody></table>");
    close_block(ctx);
}

fn render_button(node: &Node, ctx: &mut BodyCtx) {
    let align = node.attribute("align").unwrap_or("center");
    let background = node.attribute("background-color").unwrap_or("#414141");
    let border_radius = node.attribute("border-radius").unwrap_or("3px");
    let inner_padding = node.attribute("inner-padding").unwrap_or("10px 25px");
    let vertical_align = node.attribute("vertical-align").unwrap_or("middle");

    open_block(node, ctx, Some(align), "10px 25px");
    ctx.out.push_str(
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" \
         style=\"border-collapse:separate;line-height:100%;\"><tbody><tr>",
    );
    Tag::new("td")
        .attr("align", "center")
        .attr("bgcolor", background)
        .attr("role", "presentation")
        .attr("valign", vertical_align)
        .style("border", node.attribute("border").unwrap_or("none"))
        .style("border-radius", border_radius)
        .style("cursor", "auto")
        .style("mso-padding-alt", inner_padding)
        .style("background", background)
        .open(&mut ctx.out);

    let content = Tag::new(if node.attribute("href").is_some() { "a" } else { "p" })
        .maybe_attr("href", node.attribute("href"))
        .maybe_attr(
            "target",
            node.attribute("href")
                .map(|_| node.attribute("target").unwrap_or("_blank")),
        )
        .maybe_attr("rel", node.attribute("rel"))
        .style("display", "inline-block")
        .style("background", background)
        .style("color", node.attribute("color").unwrap_or("#ffffff"))
        .style("font-family", node.attribute("font-family").unwrap_or(DEFAULT_FONT))
        .style("font-size", node.attribute("font-size").unwrap_or("13px"))
        .style("font-weight", node.attribute("font-weight").unwrap_or("normal"))
        .style("line-height", node.attribute("line-height").unwrap_or("120%"))
        .style("margin", "0")
        .style("text-decoration", "none")
        .style("text-transform", "none")
        .style("padding", inner_padding)
        .style("mso-padding-alt", "0px")
        .style("border-radius", border_radius);
    content.open(&mut ctx.out);
    ctx.out.push_str(&node.text_content());
    content.close(&mut ctx.out);

    ctx.out.push_str("</td></tr></tbody></table>");
    close_block(ctx);
}

fn render_divider(node: &Node, ctx: &mut BodyCtx) {
    let border = format!(
        "{} {} {}",
        node.attribute("border-style").unwrap_or("solid"),
        node.attribute("border-width").unwrap_or("4px"),
        node.attribute("border-color").unwrap_or("#000000"),
    );
    let width = node.attribute("width").unwrap_or("100%");

    open_block(node, ctx, Some("center"), "10px 25px");
    write!(
        ctx.out,
        "<p style=\"border-top:{border};font-size:1px;margin:0px auto;width:{width};\"></p>"
    )
    .unwrap();
    ctx.out.push_str(COND_START);
    write!(
        ctx.out,
        "<table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" \
         role=\"presentation\" style=\"border-top:{border};font-size:1px;margin:0px auto;\
         width:{DEFAULT_CONTENT_WIDTH};\" width=\"550\"><tr><td style=\"height:0;line-height:0;\">\
         &nbsp;</td></tr></table>"
    )
    .unwrap();
    ctx.out.push_str(COND_END);
    close_block(ctx);
}

fn render_spacer(node: &Node, ctx: &mut BodyCtx) {
    let height = node.attribute("height").unwrap_or("20px");
    open_block(node, ctx, None, "0");
    write!(
        ctx.out,
        "<div style=\"height:{height};line-height:{height};\">&#8202;</div>"
    )
    .unwrap();
    close_block(ctx);
}

fn render_social(node: &Node, ctx: &mut BodyCtx) {
    let align = node.attribute("align").unwrap_or("center");
    let icon_size = node.attribute("icon-size").unwrap_or("20px");

    open_block(node, ctx, Some(align), "10px 25px");
    ctx.out.push_str(COND_START);
    ctx.out.push_str(
        "<table align=\"center\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\" \
         role=\"presentation\"><tr>",
    );
    ctx.out.push_str(COND_END);

    for child in &node.children {
        match child {
            Child::Element(element) if element.kind == ElementKind::SocialElement => {
                render_social_element(element, ctx, icon_size);
            }
            Child::Comment(text) => ctx.comment(text),
            _ => {}
        }
    }

    ctx.out.push_str(COND_START);
    ctx.out.push_str("</tr></table>");
    ctx.out.push_str(COND_END);
    close_block(ctx);
}

/// Default icon background per network name.
fn social_background(name: &str) -> &'static str {
    match name {
        "facebook" => "#3b5998",
        "twitter" => "#55acee",
        "x" => "#000000",
        "google" => "#dc4e41",
        "instagram" => "#3f729b",
        "linkedin" => "#0077b5",
        "pinterest" => "#bd081c",
        "youtube" => "#EB3323",
        "github" => "#000000",
        "web" => "#4BADE9",
        _ => "#000000",
    }
}

fn render_social_element(node: &Node, ctx: &mut BodyCtx, icon_size: &str) {
    let name = node.attribute("name").unwrap_or("");
    let icon_size = node.attribute("icon-size").unwrap_or(icon_size);
    let background = node
        .attribute("background-color")
        .map(str::to_string)
        .unwrap_or_else(|| social_background(name).to_string());
    let border_radius = node.attribute("border-radius").unwrap_or("3px");
    let src = match node.attribute("src") {
        Some(src) => src.to_string(),
        None => {
            let origin = ctx
                .options
                .social_icon_origin()
                .unwrap_or(DEFAULT_ICON_ORIGIN);
            format!("{origin}{name}.png")
        }
    };

    ctx.out.push_str(COND_START);
    ctx.out.push_str("<td>");
    ctx.out.push_str(COND_END);

    ctx.out.push_str(
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" \
         style=\"float:none;display:inline-table;\"><tbody><tr>\
         <td style=\"padding:4px;vertical-align:middle;\">",
    );
    Tag::new("table")
        .attr("border", "0")
        .attr("cellpadding", "0")
        .attr("cellspacing", "0")
        .attr("role", "presentation")
        .style("background", &background)
        .style("border-radius", border_radius)
        .style("width", icon_size)
        .open(&mut ctx.out);
    ctx.out.push_str("<tbody><tr>");
    Tag::new("td")
        .style("font-size", "0")
        .style("height", icon_size)
        .style("vertical-align", "middle")
        .style("width", icon_size)
        .open(&mut ctx.out);

    let link = node.attribute("href").map(|href| {
        Tag::new("a")
            .attr("href", href)
            .attr("target", node.attribute("target").unwrap_or("_blank"))
            .maybe_attr("rel", node.attribute("rel"))
    });
    if let Some(link) = &link {
        link.open(&mut ctx.out);
    }
    Tag::new("img")
        .attr("alt", node.attribute("alt").unwrap_or(name))
        .attr("height", icon_size.trim_end_matches("px"))
        .attr("src", src)
        .style("border-radius", border_radius)
        .style("display", "block")
        .attr("width", icon_size.trim_end_matches("px"))
        .closed(&mut ctx.out);
    if let Some(link) = &link {
        link.close(&mut ctx.out);
    }

    ctx.out.push_str("</td></tr></tbody></table></td></tr></tbody></table>");

    ctx.out.push_str(COND_START);
    ctx.out.push_str("</td>");
    ctx.out.push_str(COND_END);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ParserOptions;
    use crate::parser::parse;

    fn render_markup(markup: &str, options: &RenderOptions) -> Rendered {
        let doc = parse(markup, &ParserOptions::default()).unwrap();
        render_document(&doc, options)
    }

    #[test]
    fn output_starts_with_doctype() {
        let rendered = render_markup("<mjml/>", &RenderOptions::default());
        assert!(rendered.content.starts_with("<!doctype html>"));
        assert!(rendered.content.ends_with("</html>"));
    }

    #[test]
    fn lang_attribute_lands_on_html() {
        let rendered = render_markup(r#"<mjml lang="fr"/>"#, &RenderOptions::default());
        assert!(rendered.content.contains("<html lang=\"fr\""));
    }

    #[test]
    fn title_is_extracted_and_rendered() {
        let rendered = render_markup(
            "<mjml><mj-head><mj-title>Newsletter</mj-title></mj-head></mjml>",
            &RenderOptions::default(),
        );
        assert_eq!(rendered.title.as_deref(), Some("Newsletter"));
        assert!(rendered.content.contains("<title>Newsletter</title>"));
    }

    #[test]
    fn missing_title_is_none() {
        let rendered = render_markup("<mjml/>", &RenderOptions::default());
        assert_eq!(rendered.title, None);
        assert_eq!(rendered.preview, None);
        assert!(rendered.content.contains("<title></title>"));
    }

    #[test]
    fn preview_renders_hidden_div() {
        let rendered = render_markup(
            "<mjml><mj-head><mj-preview>Sneak peek</mj-preview></mj-head></mjml>",
            &RenderOptions::default(),
        );
        assert_eq!(rendered.preview.as_deref(), Some("Sneak peek"));
        assert!(rendered.content.contains("display:none"));
        assert!(rendered.content.contains("Sneak peek"));
    }

    #[test]
    fn text_content_passes_through() {
        let rendered = render_markup(
            "<mjml><mj-body><mj-section><mj-column><mj-text><b>bold</b></mj-text></mj-column></mj-section></mj-body></mjml>",
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("<b>bold</b>"));
    }

    #[test]
    fn two_columns_split_evenly() {
        let rendered = render_markup(
            "<mjml><mj-body><mj-section><mj-column/><mj-column/></mj-section></mj-body></mjml>",
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("mj-column-per-50"));
        assert!(
            rendered
                .content
                .contains(".mj-column-per-50 { width:50% !important; max-width:50%; }")
        );
        assert!(rendered.content.contains("width:300px"));
    }

    #[test]
    fn three_columns_get_fractional_width() {
        let rendered = render_markup(
            "<mjml><mj-body><mj-section><mj-column/><mj-column/><mj-column/></mj-section></mj-body></mjml>",
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("mj-column-per-33-33"));
        assert!(rendered.content.contains("width:33.33%"));
    }

    #[test]
    fn explicit_column_width_wins() {
        let rendered = render_markup(
            r#"<mjml><mj-body><mj-section><mj-column width="25%"/><mj-column/></mj-section></mj-body></mjml>"#,
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("mj-column-per-25"));
        assert!(rendered.content.contains("width:150px"));
    }

    #[test]
    fn conditional_comments_wrap_sections() {
        let rendered = render_markup(
            "<mjml><mj-body><mj-section><mj-column/></mj-section></mj-body></mjml>",
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("<!--[if mso | IE]>"));
        assert!(rendered.content.contains("<![endif]-->"));
    }

    #[test]
    fn source_comments_follow_disable_flag() {
        let markup = "<mjml><mj-body><!-- marker --></mj-body></mjml>";
        let kept = render_markup(markup, &RenderOptions::default());
        assert!(kept.content.contains("<!-- marker -->"));

        let options = RenderOptions::builder().disable_comments(true).build();
        let stripped = render_markup(markup, &options);
        assert!(!stripped.content.contains("<!-- marker -->"));
        // Structural conditionals stay.
        assert!(stripped.content.contains("<!--[if mso]>"));
    }

    #[test]
    fn social_icon_origin_override() {
        let markup = r#"<mjml><mj-body><mj-section><mj-column><mj-social><mj-social-element name="facebook" /></mj-social></mj-column></mj-section></mj-body></mjml>"#;
        let default = render_markup(markup, &RenderOptions::default());
        assert!(default.content.contains(
            "https://www.mailjet.com/images/theme/v1/icons/ico-social/facebook.png"
        ));

        let options = RenderOptions::builder()
            .social_icon_origin("https://icons.example.com/")
            .build();
        let overridden = render_markup(markup, &options);
        assert!(overridden
            .content
            .contains("https://icons.example.com/facebook.png"));
        assert!(!overridden.content.contains("mailjet.com"));
    }

    #[test]
    fn image_renders_src_and_link() {
        let rendered = render_markup(
            r#"<mjml><mj-body><mj-section><mj-column><mj-image src="a.png" href="https://example.com" alt="pic"/></mj-column></mj-section></mj-body></mjml>"#,
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("src=\"a.png\""));
        assert!(rendered.content.contains("alt=\"pic\""));
        assert!(rendered.content.contains("<a href=\"https://example.com\" target=\"_blank\">"));
    }

    #[test]
    fn button_without_href_uses_p() {
        let rendered = render_markup(
            "<mjml><mj-body><mj-section><mj-column><mj-button>Go</mj-button></mj-column></mj-section></mj-body></mjml>",
            &RenderOptions::default(),
        );
        assert!(rendered.content.contains("<p "));
        assert!(rendered.content.contains(">Go</p>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let markup = r#"<mjml><mj-head><mj-title>T</mj-title></mj-head><mj-body><mj-section><mj-column width="200px"><mj-text>x</mj-text><mj-divider/><mj-spacer/></mj-column></mj-section></mj-body></mjml>"#;
        let options = RenderOptions::default();
        let first = render_markup(markup, &options);
        let second = render_markup(markup, &options);
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn fmt_number_trims() {
        assert_eq!(fmt_number(50.0), "50");
        assert_eq!(fmt_number(100.0 / 3.0), "33.33");
        assert_eq!(fmt_number(62.5), "62.5");
    }
}
