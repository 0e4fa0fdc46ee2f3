use super::*;

/// Parses markup into a fresh [`Dom`]. Comments are kept as nodes, other
/// declarations are dropped; `<script>` and `<style>` bodies are kept verbatim
/// as a single text child.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();

    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let Some(end) = find_subslice(bytes, i + 4, b"-->") else {
                return Err(Error::HtmlParse("unclosed HTML comment".into()));
            };
            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("invalid stack state".into()))?;
            dom.create_comment(parent, html[i + 4..end].to_string());
            i = end + 3;
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(|next| is_markup_start(*next)) {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;

                // Stray end tags with no open counterpart are ignored.
                let open = stack.iter().skip(1).any(|node| {
                    dom.tag_name(*node)
                        .is_some_and(|open_tag| open_tag.eq_ignore_ascii_case(&tag))
                });
                if !open {
                    continue;
                }
                while stack.len() > 1 {
                    let top = *stack
                        .last()
                        .ok_or_else(|| Error::HtmlParse("invalid stack state".into()))?;
                    let top_tag = dom.tag_name(top).unwrap_or("");
                    let closes = top_tag.eq_ignore_ascii_case(&tag);
                    stack.pop();
                    if closes {
                        break;
                    }
                }
                continue;
            }

            if starts_with_at(bytes, i, b"<!") {
                i = parse_declaration_tag(html, i)?;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            close_optional_list_item_start_tag(&dom, &mut stack, &tag);
            close_optional_paragraph_start_tag(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) && !self_closing {
                let close = find_case_insensitive_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        let text = if tag == "script" || tag == "style" {
                            body.to_string()
                        } else {
                            decode_html_character_references(body)
                        };
                        dom.create_text(node, text);
                    }
                }
                i = close;
                let (_, after_end) = parse_end_tag(html, i)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len()
            && !(bytes[i] == b'<' && bytes.get(i + 1).is_some_and(|next| is_markup_start(*next)))
        {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            if !text.is_empty() {
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                let decoded = decode_html_character_references(text);
                if !decoded.is_empty() {
                    dom.create_text(parent, decoded);
                }
            }
        }
    }

    Ok(dom)
}

/// Returns the leading `<!DOCTYPE ...>` declaration, if the markup starts with one.
pub(crate) fn leading_doctype(html: &str) -> Option<String> {
    let trimmed = html.trim_start();
    let bytes = trimmed.as_bytes();
    if bytes.len() < 9 || !bytes[..9].eq_ignore_ascii_case(b"<!doctype") {
        return None;
    }
    let end = parse_declaration_tag(trimmed, 0).ok()?;
    trimmed.get(..end).map(ToOwned::to_owned)
}

fn is_markup_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'/' || b == b'!'
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

fn close_optional_list_item_start_tag(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if !tag.eq_ignore_ascii_case("li") {
        return;
    }

    let mut close_index = None;
    for index in (1..stack.len()).rev() {
        let Some(open_tag) = dom.tag_name(stack[index]) else {
            continue;
        };
        if open_tag.eq_ignore_ascii_case("li") {
            close_index = Some(index);
            break;
        }
        if open_tag.eq_ignore_ascii_case("ol")
            || open_tag.eq_ignore_ascii_case("ul")
            || open_tag.eq_ignore_ascii_case("menu")
        {
            break;
        }
    }

    if let Some(index) = close_index {
        stack.truncate(index);
    }
}

fn close_optional_paragraph_start_tag(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    if !is_optional_paragraph_terminator_tag(tag) {
        return;
    }

    let mut close_index = None;
    for index in (1..stack.len()).rev() {
        let Some(open_tag) = dom.tag_name(stack[index]) else {
            continue;
        };
        if open_tag.eq_ignore_ascii_case("p") {
            close_index = Some(index);
            break;
        }
        // A <p> inside a sectioning container stays open only within it.
        if open_tag.eq_ignore_ascii_case("div")
            || open_tag.eq_ignore_ascii_case("section")
            || open_tag.eq_ignore_ascii_case("main")
            || open_tag.eq_ignore_ascii_case("body")
        {
            break;
        }
    }

    if let Some(index) = close_index {
        stack.truncate(index);
    }
}

fn is_optional_paragraph_terminator_tag(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unclosed start tag <{tag}>")));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'>' {
            self_closing = true;
            i += 2;
            break;
        }

        if !is_attr_name_char(bytes[i]) {
            // Skip junk tokens between attributes the way browsers recover.
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && bytes[i] != b'>'
                && !(bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'>')
            {
                i += 1;
            }
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        skip_ws(bytes, &mut i);

        let value = if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, bytes, &mut i)?
        } else {
            String::new()
        };

        // First occurrence wins, as in browsers.
        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_declaration_tag(html: &str, at: usize) -> Result<usize> {
    let bytes = html.as_bytes();
    let mut i = at;

    if !(bytes.get(i) == Some(&b'<') && bytes.get(i + 1) == Some(&b'!')) {
        return Err(Error::HtmlParse("expected declaration tag".into()));
    }
    i += 2;

    let mut single_quoted = false;
    let mut double_quoted = false;

    while i < bytes.len() {
        let b = bytes[i];

        if single_quoted {
            single_quoted = b != b'\'';
        } else if double_quoted {
            double_quoted = b != b'"';
        } else {
            match b {
                b'\'' => single_quoted = true,
                b'"' => double_quoted = true,
                b'>' => return Ok(i + 1),
                _ => {}
            }
        }

        i += 1;
    }

    Err(Error::HtmlParse("unclosed declaration tag".into()))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;

    if !(bytes.get(i) == Some(&b'<') && bytes.get(i + 1) == Some(&b'/')) {
        return Err(Error::HtmlParse("expected end tag".into()));
    }
    i += 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse("unclosed end tag".into()));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        *i += 1;
        return Ok(decode_html_character_references(value));
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !(bytes[*i] == b'/' && *i + 1 < bytes.len() && bytes[*i + 1] == b'>')
    {
        *i += 1;
    }

    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_html_character_references(value))
}

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "copy" => Some('©'),
            "laquo" => Some('«'),
            "raquo" => Some('»'),
            "ldquo" => Some('“'),
            "rdquo" => Some('”'),
            "lsquo" => Some('‘'),
            "rsquo" => Some('’'),
            "hellip" => Some('…'),
            "middot" => Some('·'),
            "ndash" => Some('–'),
            "mdash" => Some('—'),
            "aacute" => Some('á'),
            "eacute" => Some('é'),
            "iacute" => Some('í'),
            "oacute" => Some('ó'),
            "uacute" => Some('ú'),
            "atilde" => Some('ã'),
            "otilde" => Some('õ'),
            "ccedil" => Some('ç'),
            "ecirc" => Some('ê'),
            "ocirc" => Some('ô'),
            "agrave" => Some('à'),
            "Aacute" => Some('Á'),
            "Eacute" => Some('É'),
            "Ccedil" => Some('Ç'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail.find(';').and_then(|semicolon| {
            let raw = &tail[..semicolon];
            if raw.is_empty() || raw.contains('&') {
                return None;
            }
            let ch = match raw.strip_prefix('#') {
                Some(numeric) => decode_numeric(numeric),
                None => decode_named(raw),
            }?;
            Some((ch, semicolon + 1))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);

    out
}

pub(crate) fn escape_html_text_for_serialization(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn escape_html_attr_for_serialization(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':' || b == b'@'
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    if at + needle.len() > bytes.len() {
        return false;
    }
    &bytes[at..at + needle.len()] == needle
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_case_insensitive_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1) == Some(&b'/') {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let tag_end = j + tag.len();
            if tag_end <= bytes.len()
                && bytes[j..tag_end].eq_ignore_ascii_case(tag)
                && bytes.get(tag_end).is_none_or(|after| !after.is_ascii_alphanumeric())
            {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}
