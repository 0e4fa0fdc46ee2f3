use super::*;

mod scheduler_suite;
mod selector_html;

/// Two index links, two matching sections, and the `#musicas` anchor.
const LYRICS_PAGE: &str = r##"<!DOCTYPE html>
<html>
<body>
  <nav class="indice-horizontal">
    <a href="#letra1" onclick="navegarParaLetra('bora-ate-a-vitoria')">Bora Ate a Vitoria</a>
    <a href="#letra2" onclick="navegarParaLetra('um-abraco')">Um Abraco</a>
  </nav>
  <main>
    <div id="letra1" class="letra-musical" data-titulo="bora ate a vitoria">
      <div class="flex-botoes">
        <button class="botao-toggle" onclick="toggleLetra(this)" aria-expanded="false" aria-controls="conteudo1">Bora Ate a Vitoria</button>
      </div>
      <div class="conteudo-letra" id="conteudo1"><p>Bora, bora</p></div>
    </div>
    <div id="letra2" class="letra-musical" data-titulo="um abraco">
      <div class="flex-botoes">
        <button class="botao-toggle" onclick="toggleLetra(this)" aria-expanded="false" aria-controls="conteudo2">Um Abraco</button>
      </div>
      <div class="conteudo-letra" id="conteudo2"><p>Um abraco</p></div>
    </div>
    <section id="musicas"></section>
  </main>
</body>
</html>
"##;

/// Builds a page with one index link per slug and no lyric sections.
fn index_only_page(slugs: &[&str]) -> String {
    let links = slugs
        .iter()
        .map(|slug| format!(r#"<a onclick="navegarParaLetra('{slug}')">{slug}</a>"#))
        .collect::<String>();
    format!(
        r#"<html><body><nav class="indice-horizontal">{links}</nav><main><section id="musicas"></section></main></body></html>"#
    )
}
