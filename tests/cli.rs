use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const CONSISTENT: &str = r##"<!DOCTYPE html>
<html>
<body>
  <nav class="indice-horizontal">
    <a href="#" onclick="navegarParaLetra('bora'); return false;">Bora</a>
  </nav>
  <main>
    <div id="letra1" class="letra-musical" data-titulo="bora">
      <div class="flex-botoes">
        <button class="botao-toggle" onclick="toggleLetra(this)" aria-expanded="false" aria-controls="conteudo1">Bora</button>
        <button class="botao-qr" onclick="abrirModalQR()">QR</button>
      </div>
      <div class="conteudo-letra" id="conteudo1"></div>
    </div>
    <section id="musicas"></section>
  </main>
</body>
</html>
"##;

const MISSING_SECTION: &str = r#"<body>
  <nav class="indice-horizontal">
    <a onclick="navegarParaLetra('nova-letra')">Nova Letra</a>
  </nav>
  <!-- secoes -->
  <main><section id="musicas"></section></main>
</body>"#;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lyrics-doctor"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run lyrics-doctor")
}

fn write_page(dir: &Path, name: &str, html: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, html).expect("write page");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn check_exit_code_follows_defects() {
    let temp = tempfile::tempdir().expect("tempdir");
    let clean = write_page(temp.path(), "clean.html", CONSISTENT);
    let broken = write_page(temp.path(), "broken.html", MISSING_SECTION);

    let output = run(&["check", clean.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("0 defects"));

    let output = run(&["check", broken.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("1. \"Nova Letra\" -> \"nova letra\": missing"), "{out}");
    assert!(out.contains("1 defects"));
}

#[test]
fn unreadable_file_exits_with_two() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("nao-existe.html");
    let output = run(&["check", missing.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("error: io error"));
}

#[test]
fn repair_writes_output_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let broken = write_page(temp.path(), "broken.html", MISSING_SECTION);
    let repaired = temp.path().join("repaired.html");

    let output = run(&[
        "repair",
        broken.to_str().expect("utf-8 path"),
        "-o",
        repaired.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("created #letra1"), "{err}");
    assert!(err.contains("1 repairs"), "{err}");

    let html = std::fs::read_to_string(&repaired).expect("read repaired page");
    assert!(html.contains("data-titulo=\"nova letra\""));
    assert!(html.contains("<!-- secoes -->"));

    let output = run(&["check", repaired.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
}

#[test]
fn repair_honors_anchor_option() {
    let temp = tempfile::tempdir().expect("tempdir");
    let page = write_page(
        temp.path(),
        "page.html",
        r#"<body><nav class="indice-horizontal"><a onclick="navegarParaLetra('x')">X</a></nav><main><p id="fim"></p></main></body>"#,
    );
    let output = run(&["repair", page.to_str().expect("utf-8 path"), "--anchor-id", "fim"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let html = stdout(&output);
    let section = html.find("id=\"letra1\"").expect("section written");
    let anchor = html.find("id=\"fim\"").expect("anchor kept");
    assert!(section < anchor, "{html}");
}

#[test]
fn suite_and_diagnose_pass_on_consistent_page() {
    let temp = tempfile::tempdir().expect("tempdir");
    let clean = write_page(temp.path(), "clean.html", CONSISTENT);
    let path = clean.to_str().expect("utf-8 path");

    let output = run(&["suite", path]);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
    assert!(stdout(&output).contains("6 passed, 0 failed, 0 skipped"));

    let output = run(&["diagnose", path, "--url", "https://example.org/#letra1"]);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
    let out = stdout(&output);
    assert!(out.contains("every action is well formed"), "{out}");
    assert!(out.contains("element found for #letra1"), "{out}");
}
