use lyrics_doctor::{DefectKind, Page, PageLayout, check, structure};

const COLLECTION_PAGE: &str = r##"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8">
  <title>Coletânea de Letras</title>
  <style>.conteudo-letra { display: none; } .conteudo-letra.ativo { display: block; }</style>
</head>
<body>
  <header><h1>Coletânea</h1></header>
  <nav class="indice-horizontal">
    <a href="#" onclick="navegarParaLetra('bora-até-a-vitória'); return false;">Bora Até a Vitória</a>
    <a href="#" onclick="navegarParaLetra('um-abraço-do-tamanho-do-mundo')">Um Abraço do Tamanho do Mundo</a>
    <a href="#" onclick="navegarParaLetra('guerra-não-é-partida-de-futebol')">Guerra Não É Partida De Futebol</a>
  </nav>
  <main>
    <div id="letra1" class="letra-musical" data-titulo="bora até a vitória">
      <div class="flex-botoes">
        <button class="botao-toggle" onclick="toggleLetra(this)" aria-expanded="false">🎵 Bora Até a Vitória</button>
      </div>
      <div class="conteudo-letra" id="conteudo1"><p>Bora, bora, bora</p></div>
    </div>
    <section id="musicas"><h2>Músicas</h2></section>
  </main>
  <script>
    function toggleLetra(botao) { /* ... */ }
  </script>
</body>
</html>
"##;

#[test]
fn collection_page_is_checked_and_repaired() -> lyrics_doctor::Result<()> {
    let mut page = Page::from_html(COLLECTION_PAGE)?;

    let report = structure(&page)?;
    assert_eq!(report.navigation_links, 3);
    assert_eq!(report.content_sections, 1);
    assert_eq!(report.missing_sections, 2);
    let expected = report
        .defects
        .iter()
        .map(|defect| (defect.index, defect.expected_title.as_str(), &defect.kind))
        .collect::<Vec<_>>();
    assert_eq!(
        expected,
        vec![
            (2, "um abraço do tamanho do mundo", &DefectKind::Missing),
            (3, "guerra não é partida de futebol", &DefectKind::Missing),
        ]
    );

    let repaired = page.repair_in_place()?;
    assert_eq!(repaired.created, vec!["letra2", "letra3"]);
    assert_eq!(repaired.linked_controls, vec!["conteudo1"]);
    assert_eq!(repaired.repairs, 3);

    let after = structure(&page)?;
    assert!(after.is_clean(), "still broken: {after:?}");
    assert_eq!(after.toggle_controls, 3);

    let html = page.to_html();
    assert!(html.starts_with("<!DOCTYPE html>\n"));
    assert!(html.contains("data-titulo=\"guerra não é partida de futebol\""));
    assert!(html.contains("function toggleLetra(botao) { /* ... */ }"));

    let reparsed = Page::from_html(&html)?;
    assert!(structure(&reparsed)?.is_clean());
    Ok(())
}

#[test]
fn repaired_sections_sit_before_the_anchor() -> lyrics_doctor::Result<()> {
    let mut page = Page::from_html(COLLECTION_PAGE)?;
    page.repair_in_place()?;

    let main = page.select_one("main")?;
    let ids = page
        .query_selector_all("main > *")?
        .into_iter()
        .filter(|node| page.parent(*node) == Some(main))
        .filter_map(|node| page.attr(node, "id"))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["letra1", "letra2", "letra3", "musicas"]);
    Ok(())
}

#[test]
fn check_is_pure_over_snapshots() -> lyrics_doctor::Result<()> {
    let page = Page::from_html(COLLECTION_PAGE)?;
    let entries = page.navigation_entries()?;
    let sections = page.content_sections()?;
    let before = page.to_html();

    assert_eq!(check(&entries, &sections).len(), 2);
    assert_eq!(check(&entries, &sections), check(&entries, &sections));
    assert_eq!(page.to_html(), before);
    Ok(())
}

#[test]
fn custom_layout_checks_other_markup() -> lyrics_doctor::Result<()> {
    let layout = PageLayout {
        navigation_selector: "#menu li > a".to_string(),
        section_selector: "article.song".to_string(),
        title_attribute: "data-title".to_string(),
        action_attribute: "data-action".to_string(),
        action_pattern: r"open\('([^']+)'\)".to_string(),
        ..PageLayout::default()
    };
    let page = Page::from_html_with_layout(
        r#"
        <ul id="menu">
          <li><a data-action="open('first-song')">First</a></li>
          <li><a data-action="open('second-song')">Second</a></li>
        </ul>
        <article class="song" id="s1" data-title="first song"></article>
        "#,
        layout,
    )?;
    let defects = check(&page.navigation_entries()?, &page.content_sections()?);
    assert_eq!(defects.len(), 1);
    assert_eq!(defects[0].slug, "second-song");
    Ok(())
}

#[test]
fn repair_keeps_comments_in_the_written_page() -> lyrics_doctor::Result<()> {
    let mut page = Page::from_html(
        r#"<!DOCTYPE html>
<html>
<head><!--[if lt IE 9]><script src="html5shiv.js"></script><![endif]--></head>
<body>
  <!-- licença: CC BY-SA 4.0 -->
  <nav class="indice-horizontal">
    <!-- indice de letras -->
    <a onclick="navegarParaLetra('nova-letra')">Nova Letra</a>
  </nav>
  <main><section id="musicas"><!-- fim das letras --></section></main>
</body>
</html>"#,
    )?;
    let report = page.repair_in_place()?;
    assert_eq!(report.created, vec!["letra1"]);

    let html = page.to_html();
    for comment in [
        "<!--[if lt IE 9]><script src=\"html5shiv.js\"></script><![endif]-->",
        "<!-- licença: CC BY-SA 4.0 -->",
        "<!-- indice de letras -->",
        "<!-- fim das letras -->",
    ] {
        assert!(html.contains(comment), "lost {comment}");
    }
    assert_eq!(page.navigation_entries()?[0].display_text, "Nova Letra");
    assert!(structure(&Page::from_html(&html)?)?.is_clean());
    Ok(())
}
