//! Root harness pages
//!
//! Widgets get a side-by-side view of the build and interface previews.
//! Themes get a template picker that loads each template in a frame.

use crate::assembler::{escape_html, RUNTIME_URL};
use crate::manifest::Manifest;

/// Render the root page for the loaded component.
pub fn root_page(manifest: &Manifest) -> String {
    if manifest.is_theme() {
        theme_page(manifest)
    } else {
        widget_page(manifest)
    }
}

fn widget_page(manifest: &Manifest) -> String {
    let body = r#"    <main class="panes">
        <section class="pane">
            <h2>Build</h2>
            <iframe name="build" src="/build"></iframe>
        </section>
        <section class="pane">
            <h2>Interface</h2>
            <iframe name="interface" src="/interface"></iframe>
        </section>
    </main>
    <script>
        window.addEventListener('message', function (event) {
            if (event.data && event.data.type === 'preview:data-saved') {
                document.querySelector('iframe[name="build"]').contentWindow.location.reload();
            }
        });
    </script>"#;

    shell(manifest, body)
}

fn theme_page(manifest: &Manifest) -> String {
    let links: String = manifest
        .templates
        .iter()
        .map(|template| {
            format!(
                r#"            <li><a href="/templates/{href}" target="template">{label}</a></li>
"#,
                href = escape_html(&urlencoding::encode(template)),
                label = escape_html(template),
            )
        })
        .collect();

    let first = manifest
        .templates
        .first()
        .map(|t| format!("/templates/{}", urlencoding::encode(t)))
        .unwrap_or_default();

    let body = format!(
        r#"    <main class="panes">
        <nav class="pane templates">
            <h2>Templates</h2>
            <ul>
{links}            </ul>
        </nav>
        <section class="pane wide">
            <iframe name="template" src="{first}"></iframe>
        </section>
    </main>"#,
        first = escape_html(&first),
    );

    shell(manifest, &body)
}

fn shell(manifest: &Manifest, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{name} - Preview</title>
    <script src="{runtime}"></script>
    <style>
        body {{
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f4f5f7;
            color: #1a1a2e;
        }}
        header {{
            padding: 12px 20px;
            background: #1a1a2e;
            color: #fff;
        }}
        header small {{
            color: #9aa0b4;
            font-family: monospace;
            margin-left: 8px;
        }}
        .panes {{
            display: flex;
            gap: 16px;
            padding: 16px;
            height: calc(100vh - 90px);
        }}
        .pane {{
            flex: 1;
            display: flex;
            flex-direction: column;
        }}
        .pane.templates {{
            flex: 0 0 220px;
        }}
        .pane.wide {{
            flex: 1;
        }}
        h2 {{
            font-size: 0.9rem;
            text-transform: uppercase;
            margin: 0 0 8px 0;
        }}
        iframe {{
            flex: 1;
            border: 1px solid #d5d8e0;
            border-radius: 6px;
            background: #fff;
        }}
    </style>
</head>
<body>
    <header>
        <strong>{name}</strong><small>{package}</small>
    </header>
{body}
</body>
</html>
"#,
        name = escape_html(&manifest.name),
        package = escape_html(&manifest.package),
        runtime = RUNTIME_URL,
        body = body,
    )
}
