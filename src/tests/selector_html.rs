use super::*;

#[test]
fn snapshots_follow_document_order() -> Result<()> {
    let page = Page::from_html(LYRICS_PAGE)?;

    let entries = page.navigation_entries()?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].position, 0);
    assert_eq!(entries[0].display_text, "Bora Ate a Vitoria");
    assert_eq!(entries[0].target_slug.as_deref(), Some("bora-ate-a-vitoria"));
    assert_eq!(entries[1].target_slug.as_deref(), Some("um-abraco"));

    let sections = page.content_sections()?;
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].identifier, "letra1");
    assert_eq!(sections[1].title_attribute.as_deref(), Some("um abraco"));

    let toggles = page.toggle_controls()?;
    assert_eq!(toggles.len(), 2);
    assert_eq!(toggles[0].controls.as_deref(), Some("conteudo1"));
    assert_eq!(toggles[0].expanded.as_deref(), Some("false"));
    assert_eq!(toggles[1].label, "Um Abraco");
    Ok(())
}

#[test]
fn malformed_action_yields_no_slug() -> Result<()> {
    let page = Page::from_html(
        r#"
        <nav class="indice-horizontal">
          <a onclick="abrirModalQR()">Doar</a>
          <a>Sem ação</a>
          <a onclick="navegarParaLetra('ok')">Ok</a>
        </nav>
        "#,
    )?;
    let slugs = page
        .navigation_entries()?
        .into_iter()
        .map(|entry| entry.target_slug)
        .collect::<Vec<_>>();
    assert_eq!(slugs, vec![None, None, Some("ok".to_string())]);
    Ok(())
}

#[test]
fn attribute_and_combinator_selectors_match() -> Result<()> {
    let page = Page::from_html(LYRICS_PAGE)?;
    assert_eq!(
        page.query_selector_all(r#".letra-musical[data-titulo="um abraco"]"#)?.len(),
        1
    );
    assert_eq!(page.query_selector_all("[data-titulo^=bora]")?.len(), 1);
    assert_eq!(page.query_selector_all("main > .letra-musical")?.len(), 2);
    assert_eq!(page.query_selector_all(".flex-botoes + .conteudo-letra")?.len(), 2);
    assert_eq!(page.query_selector_all("#letra1 ~ #musicas")?.len(), 1);
    assert_eq!(page.query_selector_all("[data-titulo$=abraco]")?.len(), 1);
    assert_eq!(page.query_selector_all("[data-titulo~=ate]")?.len(), 1);
    assert_eq!(page.query_selector_all("nav [onclick*=navegarParaLetra]")?.len(), 2);
    assert_eq!(page.query_selector_all("nav a, #musicas")?.len(), 3);
    assert_eq!(
        page.query_selector_all(r#".botao-toggle[aria-expanded="true"]"#)?.len(),
        0
    );
    Ok(())
}

#[test]
fn closest_and_scoped_query_find_section_content() -> Result<()> {
    let page = Page::from_html(LYRICS_PAGE)?;
    let button = page.select_one("#letra2 .botao-toggle")?;
    let section = page
        .dom
        .closest(button, ".letra-musical")?
        .expect("button sits inside a section");
    assert_eq!(page.attr(section, "id").as_deref(), Some("letra2"));
    let content = page
        .dom
        .query_selector_from(section, ".conteudo-letra")?
        .expect("section has content");
    assert_eq!(page.attr(content, "id").as_deref(), Some("conteudo2"));
    Ok(())
}

#[test]
fn select_one_reports_missing_selector() -> Result<()> {
    let page = Page::from_html(LYRICS_PAGE)?;
    match page.select_one("#nao-existe") {
        Err(Error::SelectorNotFound(selector)) => assert_eq!(selector, "#nao-existe"),
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}

#[test]
fn unbalanced_selector_is_rejected() -> Result<()> {
    let page = Page::from_html(LYRICS_PAGE)?;
    assert!(matches!(
        page.query_selector_all("a[onclick"),
        Err(Error::UnsupportedSelector(_))
    ));
    assert!(matches!(
        page.query_selector_all("main >"),
        Err(Error::UnsupportedSelector(_))
    ));
    Ok(())
}

#[test]
fn character_references_are_decoded() -> Result<()> {
    let page = Page::from_html(
        r#"<p id="t" data-titulo="Vit&oacute;ria &amp; Paz">Can&ccedil;&atilde;o &#233; &#x41;</p>"#,
    )?;
    let node = page.select_one("#t")?;
    assert_eq!(page.text(node), "Canção é A");
    assert_eq!(page.attr(node, "data-titulo").as_deref(), Some("Vitória & Paz"));
    Ok(())
}

#[test]
fn script_bodies_stay_raw() -> Result<()> {
    let page = Page::from_html(
        r#"<div id="root"><script>if (a < b && c) { x = "<p>"; }</script></div>"#,
    )?;
    let root = page.select_one("#root")?;
    assert_eq!(
        page.dump_node(root),
        r#"<div id="root"><script>if (a < b && c) { x = "<p>"; }</script></div>"#
    );
    Ok(())
}

#[test]
fn comments_and_doctype_are_kept() -> Result<()> {
    let page = Page::from_html("<!DOCTYPE html><body><!-- nota --><p class=\"a\">x</p></body>")?;
    assert_eq!(
        page.to_html(),
        "<!DOCTYPE html>\n<body><!-- nota --><p class=\"a\">x</p></body>"
    );
    let body = page.select_one("body")?;
    assert_eq!(page.text(body), "x");
    assert_eq!(page.query_selector_all("body > *")?.len(), 1);
    Ok(())
}

#[test]
fn optional_paragraph_end_tags_are_closed() -> Result<()> {
    let page = Page::from_html("<div id=\"d\"><p>um<p>dois</div>")?;
    assert_eq!(page.query_selector_all("#d > p")?.len(), 2);
    Ok(())
}

#[test]
fn stray_end_tags_are_ignored() -> Result<()> {
    let page = Page::from_html("<div id=\"d\">texto</span></div><p id=\"p\"></p>")?;
    let div = page.select_one("#d")?;
    assert_eq!(page.text(div), "texto");
    assert_eq!(page.tag_name(page.select_one("#p")?), Some("p"));
    Ok(())
}

#[test]
fn unclosed_comment_is_a_parse_error() {
    let err = Page::from_html("<div><!-- sem fim").expect_err("comment never closes");
    assert!(matches!(err, Error::HtmlParse(_)));
}

#[test]
fn valueless_attributes_parse_as_empty() -> Result<()> {
    let page = Page::from_html("<button id=\"b\" disabled>x</button>")?;
    let button = page.select_one("#b")?;
    assert_eq!(page.attr(button, "disabled").as_deref(), Some(""));
    Ok(())
}

#[test]
fn deep_nesting_serializes_without_overflow() -> Result<()> {
    let depth = 5_000;
    let html = format!(
        "<div id=\"top\">{}x{}</div>",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    );
    let page = Page::from_html(&html)?;
    let top = page.select_one("#top")?;
    assert_eq!(page.text(top), "x");
    assert!(page.dump_node(top).ends_with("</div></div>"));
    Ok(())
}
