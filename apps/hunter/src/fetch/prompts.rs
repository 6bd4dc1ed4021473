// Browsing task handed to the fetch capability by the `scout` binary.

/// Scouting task. Placeholders: {keyword}, {max_results}
pub const SCOUT_TASK_TEMPLATE: &str = r#"You are a deterministic job scouting agent.

Target website: Internshala

GOAL:
Find up to {max_results} internships matching: "{keyword}"

POPUP HANDLING:
After clicking "Internships":
- Immediately close the sign-up popup if visible.
- Do NOT read it.
- Do NOT scroll before closing it.

SEARCH RULES:
1. Open https://internshala.com
2. Click "Internships"
3. Close the popup
4. Use ONLY the main keyword search bar
5. Type EXACTLY "{keyword}"
6. Press Enter
7. Do NOT use filters
8. Collect the first {max_results} relevant internships only

FOR EACH:
- Click the job title
- Extract:
    - title
    - company
    - full description
    - source_url (current URL)
- Return to the results page

OUTPUT:
Return ONLY a valid JSON list.
No markdown.
No commentary.

Format:
[
  {
    "title": "...",
    "company": "...",
    "description": "...",
    "source_url": "..."
  }
]
"#;
