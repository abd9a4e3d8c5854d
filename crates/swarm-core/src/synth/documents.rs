use std::collections::BTreeMap;

use serde_json::json;

use super::{Markdown, Synthesis, SynthInput};

fn css_header(title: &str, input: &SynthInput<'_>) -> String {
    format!(
        "/* {title} for {} -- generated by swarm at {} */\n",
        input.project_name, input.stamp
    )
}

fn jsx_header(input: &SynthInput<'_>) -> String {
    format!(
        "// {} -- generated by swarm at {}\n",
        input.project_name, input.stamp
    )
}

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn goal_lines(goals: &[String]) -> Vec<String> {
    goals.iter().map(|g| format!("{g}.")).collect()
}

// ---------------------------------------------------------------------------
// Architecture
// ---------------------------------------------------------------------------

pub fn architecture(input: &SynthInput<'_>) -> Synthesis {
    let mut files = BTreeMap::new();

    let manifest = json!({
        "name": input.slug,
        "version": "0.1.0",
        "private": true,
        "type": "module",
        "description": input.prompt,
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "react": "^18.3.1",
            "react-dom": "^18.3.1"
        },
        "devDependencies": {
            "@vitejs/plugin-react": "^4.3.1",
            "vite": "^5.4.0"
        }
    });
    let mut manifest =
        serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| "{}".to_string());
    manifest.push('\n');
    files.insert("package.json".to_string(), manifest);

    files.insert(
        "index.html".to_string(),
        format!(
            r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{name}</title>
  </head>
  <body>
    <!-- generated by swarm at {stamp} -->
    <div id="root"></div>
    <script type="module" src="/src/main.jsx"></script>
  </body>
</html>
"#,
            name = input.project_name,
            stamp = input.stamp,
        ),
    );

    files.insert(
        "src/main.jsx".to_string(),
        format!(
            r#"{header}import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App.jsx';
import './styles/tokens.css';
import './styles/app.css';
import './styles/responsive.css';

ReactDOM.createRoot(document.getElementById('root')).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>,
);
"#,
            header = jsx_header(input),
        ),
    );

    let mut readme = Markdown::new(input.project_name, input.stamp);
    readme
        .line(&format!("> {}", input.prompt))
        .blank()
        .owned_section("Goals", &goal_lines(input.goals))
        .section(
            "Getting started",
            &[
                "`npm install` to fetch dependencies",
                "`npm run dev` to start the development server",
                "`npm run build` to produce an optimised bundle in `dist/`",
            ],
        )
        .section(
            "Project documents",
            &[
                "`docs/architecture.md` -- folder layout and data flow",
                "`docs/components.md` -- component contracts",
                "`docs/styling.md` -- design tokens",
                "`docs/accessibility.md` -- accessibility checklist",
                "`docs/responsive.md` -- breakpoints and layout strategy",
                "`docs/performance.md` -- rendering and data-handling budget",
            ],
        );
    files.insert("README.md".to_string(), readme.finish());

    let mut doc = Markdown::new(
        &format!("Architecture Blueprint: {}", input.project_name),
        input.stamp,
    );
    doc.line(&format!("Prompt: \"{}\"", input.prompt))
        .blank()
        .section(
            "Folder layout",
            &[
                "`src/components` -- feature oriented React components",
                "`src/hooks` -- shared logic hooks for data fetching and realtime updates",
                "`src/state` -- context provider exposing application state",
                "`src/styles` -- tokens for color, spacing, and typography",
                "`src/utils` -- pure helpers for formatting and derivation",
            ],
        )
        .section(
            "State management and data flow",
            &[
                "A reducer-based store is exposed through a single React context",
                "Network clients push domain events into the store; components never fetch directly",
                "Derived selectors feed every visualisation so views stay stateless",
            ],
        )
        .section(
            "Dependency boundaries",
            &[
                "Presentational components consume only context and hooks",
                "Networking is isolated to `src/hooks`",
                "Styling tokens are consumed via CSS custom properties",
            ],
        )
        .owned_section("Goals this architecture serves", &goal_lines(input.goals));
    files.insert("docs/architecture.md".to_string(), doc.finish());

    Synthesis {
        summary: format!(
            "Architecture blueprint for {}: folder layout, data flow, and dependency boundaries.",
            input.project_name
        ),
        message: "Outlined the frontend architecture, folder structure, and data boundaries."
            .to_string(),
        files,
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

pub fn component(input: &SynthInput<'_>) -> Synthesis {
    let mut files = BTreeMap::new();
    let header = jsx_header(input);

    files.insert(
        "src/App.jsx".to_string(),
        format!(
            r#"{header}import AppShell from './components/AppShell.jsx';
import GoalList from './components/GoalList.jsx';

export default function App() {{
  return (
    <AppShell title={{{title}}}>
      <GoalList />
    </AppShell>
  );
}}
"#,
            title = js_string(input.project_name),
        ),
    );

    files.insert(
        "src/components/AppShell.jsx".to_string(),
        format!(
            r#"{header}export default function AppShell({{ title, children }}) {{
  return (
    <div className="app-shell">
      <header className="app-shell__header">
        <h1>{{title}}</h1>
      </header>
      <main className="app-shell__main" aria-live="polite">
        {{children}}
      </main>
    </div>
  );
}}
"#
        ),
    );

    let goals = serde_json::to_string_pretty(input.goals).unwrap_or_else(|_| "[]".to_string());
    files.insert(
        "src/components/GoalList.jsx".to_string(),
        format!(
            r#"{header}const GOALS = {goals};

export default function GoalList() {{
  return (
    <section className="goal-list" aria-label="Project goals">
      <h2>Goals</h2>
      <ol>
        {{GOALS.map((goal) => (
          <li key={{goal}} className="goal-list__item">{{goal}}</li>
        ))}}
      </ol>
    </section>
  );
}}
"#
        ),
    );

    files.insert(
        "src/styles/app.css".to_string(),
        format!(
            r#"{}.app-shell {{
  min-height: 100vh;
  display: grid;
  grid-template-rows: auto 1fr;
  background: var(--color-background);
  color: var(--color-text);
  font-family: var(--font-sans);
}}

.app-shell__header {{
  padding: var(--space-4) var(--space-6);
  border-bottom: 1px solid var(--color-border);
}}

.app-shell__main {{
  padding: var(--space-6);
}}

.goal-list__item {{
  padding: var(--space-2) var(--space-3);
  border-left: 3px solid var(--color-accent);
  margin-bottom: var(--space-2);
}}

.goal-list__item:nth-child(even) {{
  background: var(--color-surface);
}}
"#,
            css_header("Application styles", input)
        ),
    );

    let mut doc = Markdown::new(
        &format!("Component Contracts: {}", input.project_name),
        input.stamp,
    );
    doc.line(&format!("Prompt: \"{}\"", input.prompt))
        .blank()
        .section(
            "Top-level components",
            &[
                "`AppShell` -- owns the layout regions and the page heading",
                "`GoalList` -- renders the project goals as an ordered list",
                "`App` -- composes the shell with feature sections",
            ],
        )
        .section(
            "Contracts",
            &[
                "`AppShell { title: string, children: ReactNode }`",
                "`GoalList {}` -- reads goals from a module constant until a data source exists",
            ],
        )
        .owned_section("Goals covered", &goal_lines(input.goals));
    files.insert("docs/components.md".to_string(), doc.finish());

    Synthesis {
        summary: format!(
            "Component tree for {}: AppShell, GoalList, and their contracts.",
            input.project_name
        ),
        message: "Proposed React components and defined their data contracts.".to_string(),
        files,
    }
}

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

pub fn styling(input: &SynthInput<'_>) -> Synthesis {
    let mut files = BTreeMap::new();

    files.insert(
        "src/styles/tokens.css".to_string(),
        format!(
            r#"{}:root {{
  --color-background: #0b1020;
  --color-surface: #141a2e;
  --color-border: #24304f;
  --color-text: #e6e9f2;
  --color-muted: #9aa3b8;
  --color-accent: #3b82f6;

  --font-sans: system-ui, -apple-system, 'Segoe UI', sans-serif;
  --font-mono: ui-monospace, 'SFMono-Regular', monospace;

  --space-1: 0.25rem;
  --space-2: 0.5rem;
  --space-3: 0.75rem;
  --space-4: 1rem;
  --space-6: 1.5rem;
  --space-8: 2rem;
}}

@media (prefers-color-scheme: light) {{
  :root {{
    --color-background: #f8fafc;
    --color-surface: #eef2f7;
    --color-border: #d5dce8;
    --color-text: #0f172a;
    --color-muted: #475569;
  }}
}}
"#,
            css_header("Design tokens", input)
        ),
    );

    let mut doc = Markdown::new(
        &format!("Styling Guidelines: {}", input.project_name),
        input.stamp,
    );
    doc.section(
        "Design system",
        &[
            "Base colors: midnight background, electric blue accent, neutral text",
            "Typography through `--font-sans` and `--font-mono` with responsive scaling",
            "Spacing scale in multiples of 4px expressed in rem",
        ],
    )
    .section(
        "Implementation notes",
        &[
            "All tokens live in `src/styles/tokens.css` as CSS custom properties",
            "Components reference tokens only, never literal colors",
            "Alternate row backgrounds in long lists for readability",
            "Accent border-left marks the active or primary item",
        ],
    );
    files.insert("docs/styling.md".to_string(), doc.finish());

    Synthesis {
        summary: format!(
            "Design tokens and styling conventions for {}.",
            input.project_name
        ),
        message: "Established design tokens and styling conventions.".to_string(),
        files,
    }
}

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

pub fn accessibility(input: &SynthInput<'_>) -> Synthesis {
    let mut files = BTreeMap::new();

    let mut doc = Markdown::new(
        &format!("Accessibility Checklist: {}", input.project_name),
        input.stamp,
    );
    doc.section(
        "Semantic structure",
        &[
            "Use `<main>`, `<aside>`, and `<section>` landmarks inside `AppShell`",
            "Provide an `aria-live=\"polite\"` region for content that updates in place",
            "Keep one `<h1>` per page and nest headings in order",
        ],
    )
    .section(
        "Keyboard interaction",
        &[
            "Every interactive control is reachable in a logical tab order",
            "Focus rings stay visible; never remove outlines without a replacement",
            "Offer a skip link to the main region",
        ],
    )
    .section(
        "Assistive feedback",
        &[
            "Lists announce their purpose through `aria-label`",
            "Text contrast meets WCAG 2.1 AA (4.5:1) against every token background",
            "Respect `prefers-reduced-motion` for transitions",
        ],
    );
    files.insert("docs/accessibility.md".to_string(), doc.finish());

    Synthesis {
        summary: format!(
            "WCAG-driven accessibility checklist for {}.",
            input.project_name
        ),
        message: "Documented WCAG-driven requirements to keep the experience accessible."
            .to_string(),
        files,
    }
}

// ---------------------------------------------------------------------------
// Responsive design
// ---------------------------------------------------------------------------

pub fn responsive(input: &SynthInput<'_>) -> Synthesis {
    let mut files = BTreeMap::new();

    files.insert(
        "src/styles/responsive.css".to_string(),
        format!(
            r#"{}@media (max-width: 480px) {{
  .app-shell__header,
  .app-shell__main {{
    padding: var(--space-3);
  }}
}}

@media (min-width: 768px) {{
  .app-shell__main {{
    display: grid;
    grid-template-columns: minmax(0, 2fr) minmax(0, 1fr);
    gap: var(--space-6);
  }}
}}

@media (min-width: 1280px) {{
  .app-shell__main {{
    grid-template-columns: minmax(0, 1fr) minmax(0, 2fr) minmax(0, 1fr);
    max-width: 1440px;
    margin: 0 auto;
  }}
}}
"#,
            css_header("Responsive layout", input)
        ),
    );

    let mut doc = Markdown::new(
        &format!("Responsive Design Strategy: {}", input.project_name),
        input.stamp,
    );
    doc.section(
        "Breakpoints",
        &[
            "480px: single column, compact padding",
            "768px: two-column grid with a secondary side column",
            "1280px: three-panel layout capped at 1440px",
        ],
    )
    .section(
        "Techniques",
        &[
            "CSS grid templates with `minmax(0, …)` columns",
            "Horizontal scroll areas for wide content on narrow screens",
            "Charts recalculate their dimensions through `ResizeObserver`",
        ],
    );
    files.insert("docs/responsive.md".to_string(), doc.finish());

    Synthesis {
        summary: format!(
            "Breakpoints and layout strategy for {}.",
            input.project_name
        ),
        message: "Planned breakpoints and layout strategies for different screen sizes."
            .to_string(),
        files,
    }
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

pub fn performance(input: &SynthInput<'_>) -> Synthesis {
    let mut files = BTreeMap::new();

    let mut doc = Markdown::new(
        &format!("Performance Recommendations: {}", input.project_name),
        input.stamp,
    );
    doc.section(
        "Rendering",
        &[
            "Memoise list rows so bursts of updates do not re-render the whole list",
            "Window long lists instead of mounting every row",
        ],
    )
    .section(
        "Data handling",
        &[
            "Batch streamed updates per animation frame before committing to the store",
            "Move heavy derivations into web workers to keep the main thread free",
        ],
    )
    .section(
        "Budget",
        &[
            "Initial JavaScript under 170 KB compressed",
            "Largest Contentful Paint under 2.5s on a mid-range mobile device",
            "Interaction to Next Paint under 200ms",
        ],
    )
    .section(
        "Tooling",
        &["Profile with the React Profiler in development builds"],
    );
    files.insert("docs/performance.md".to_string(), doc.finish());

    Synthesis {
        summary: format!("Rendering and data-handling budget for {}.", input.project_name),
        message: "Suggested memoization, virtualization, and worker strategies for smooth rendering."
            .to_string(),
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(goals: &'a [String], stamp: &'a str) -> SynthInput<'a> {
        SynthInput {
            project_name: "Build A Todo App",
            slug: "build-a-todo-app",
            prompt: "Build a todo app with dark mode",
            goals,
            stamp,
        }
    }

    #[test]
    fn architecture_emits_manifest_entry_and_docs() {
        let goals = vec!["Build a todo app".to_string()];
        let out = architecture(&input(&goals, "t0"));
        for path in ["package.json", "index.html", "src/main.jsx", "README.md", "docs/architecture.md"] {
            assert!(out.files.contains_key(path), "missing {path}");
        }
        let manifest: serde_json::Value = serde_json::from_str(&out.files["package.json"]).unwrap();
        assert_eq!(manifest["name"], "build-a-todo-app");
    }

    #[test]
    fn goal_list_embeds_goals_as_js_array() {
        let goals = vec!["Say \"hi\"".to_string()];
        let out = component(&input(&goals, "t0"));
        let jsx = &out.files["src/components/GoalList.jsx"];
        assert!(jsx.contains(r#""Say \"hi\"""#), "{jsx}");
    }

    #[test]
    fn stamp_only_changes_comment_lines() {
        let goals = vec!["Ship it".to_string()];
        let a = architecture(&input(&goals, "2026-01-01T00:00:00.000Z"));
        let b = architecture(&input(&goals, "2027-06-30T12:00:00.000Z"));
        assert_eq!(a.files.keys().collect::<Vec<_>>(), b.files.keys().collect::<Vec<_>>());
        assert_eq!(a.files["package.json"], b.files["package.json"]);
        for (path, content) in &a.files {
            let strip = |s: &str| {
                s.lines()
                    .filter(|l| !l.contains("generated by swarm"))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            assert_eq!(strip(content), strip(&b.files[path]), "{path} differs");
        }
    }

    #[test]
    fn every_role_produces_documentation() {
        let goals = vec!["Ship it".to_string()];
        let inp = input(&goals, "t0");
        let all = [
            architecture(&inp),
            component(&inp),
            styling(&inp),
            accessibility(&inp),
            responsive(&inp),
            performance(&inp),
        ];
        for synthesis in &all {
            assert!(!synthesis.summary.is_empty());
            assert!(!synthesis.message.is_empty());
            assert!(synthesis.files.keys().any(|p| p.ends_with(".md")));
        }
    }
}
