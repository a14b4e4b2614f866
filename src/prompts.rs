//! Fixed personas, prompt templates, and user-facing texts.
//!
//! All texts are German; the service answers German-speaking users.

/// System persona for snippet combination (code-only answers).
pub const COMBINE_PERSONA: &str = "Du bist ein Experte für Lua-Programmierung. Du antwortest NUR mit sauberem, gut dokumentiertem Lua-Code ohne zusätzliche Erklärungen.";

/// System persona for plain conversation.
pub const ASSISTANT_PERSONA: &str = "Du bist ein hilfsreicher KI-Assistent, der sich auf Lua-Programmierung spezialisiert hat.

Deine Fähigkeiten:
- Lua-Code erklären, schreiben und debuggen
- Code-Snippets aus verschiedenen Quellen kombinieren
- Best Practices für Lua empfehlen
- Bei Lua-Projekten und Problemen helfen
- Performance-Optimierung von Lua-Code

Antworte IMMER auf Deutsch und sei hilfsbereit und freundlich. Wenn du Code schreibst, füge deutsche Kommentare hinzu.";

/// Visible separator placed between concatenated snippet bodies.
pub const SNIPPET_SEPARATOR: &str = "\n\n-- ---\n\n";

pub const NO_SNIPPET_FOUND: &str = "Leider konnte ich keine passenden Lua-Code-Snippets in meiner Datenbank finden. Lass mich dir stattdessen beim Erstellen von eigenem Code helfen! 💡";

pub const COMBINE_FALLBACK: &str =
    "Hier ist ein passender Code-Snippet für deine Anfrage (KI-Optimierung nicht verfügbar):";

pub const CHAT_FALLBACK: &str = "Entschuldigung, ich kann gerade nicht auf die KI zugreifen. Aber ich kann dir trotzdem bei grundlegenden Lua-Fragen helfen! Was möchtest du wissen?";

pub const METHOD_NOT_ALLOWED: &str = "Nur POST Methode erlaubt";

pub const EMPTY_MESSAGE: &str = "Nachricht darf nicht leer sein";

pub const INVALID_BODY: &str = "Ungültiger JSON-Body";

pub const INTERNAL_ERROR: &str =
    "Entschuldigung, es gab einen internen Serverfehler. Versuche es bitte erneut.";

/// Acknowledgment after a successful combination of `count` found snippets.
pub fn combined_ack(count: usize) -> String {
    format!(
        "Ich habe {} relevante Code-Snippets gefunden und für dich optimiert kombiniert! 🚀",
        count
    )
}

/// Instruction asking the model to merge `snippets` for `message`.
pub fn combine_prompt(message: &str, snippets: &str) -> String {
    format!(
        r#"Als Lua-Experte, analysiere und kombiniere den folgenden Code basierend auf der Benutzeranfrage.

Benutzeranfrage: "{message}"

Verfügbare Code-Snippets:
{snippets}

Aufgaben:
1. Wähle die relevantesten Teile aus
2. Kombiniere sie zu einer zusammenhängenden Lösung
3. Füge fehlende Funktionalität hinzu
4. Optimiere für Lesbarkeit und Performance
5. Füge deutsche Kommentare hinzu
6. Stelle sicher, dass der Code funktionsfähig ist

Gib NUR den finalen, lauffähigen Lua-Code zurück (ohne Erklärungen davor oder danach):"#
    )
}
