//! Literal phrases the game prints, as compiled patterns.

use std::sync::LazyLock;

use regex::Regex;

fn pattern(src: &str) -> Regex {
    Regex::new(src).unwrap_or_else(|e| panic!("bad vocabulary pattern {src:?}: {e}"))
}

/// Successful portal bind, capturing the key in group 1 or 2.
pub static PORTAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"^(?:You bind the portal to this place\. Its key is '([A-Za-z0-9]+)'\.?|Portal key:\s*([A-Za-z0-9]+))$",
    )
});

/// Binding can never work in this room.
pub static BIND_FAILED_PERMANENT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)^(?:something prevents you from binding a portal here|the magic of this place resists your binding)[.!]*$",
    )
});

/// Binding failed this time.
pub static BIND_FAILED_TRANSIENT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^you lost your concentration[.!]*$"));

/// Bind command echo.
pub static BIND_ATTEMPT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^(?:cast|c)\s+'?bind(?:\s+portal)?'?$"));

/// `look <direction>` command echo, direction in group 1.
pub static LOOK_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^(?:look|l)\s+(\S+)$"));

/// Plain `look` command echo.
pub static LOOK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^(?:look|l)$"));

/// `flee <direction>` command echo, direction in group 1.
pub static FLEE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^flee\s+(\S+)$"));

/// Zone query answers, name in group 1.
pub static ZONE_BANNERS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        pattern(r"(?i)^you are in the zone:?\s+(.+?)\.?$"),
        pattern(r"(?i)^\[\s*zone:\s*(.+?)\s*\]$"),
    ]
});

/// The character died.
pub static DEATH: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^you (?:are dead|have been killed)[.!]*$"));

/// The character came back to life somewhere.
pub static RESPAWN: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^you (?:awaken|have been resurrected)\b"));

/// Movement refused because there is no exit that way.
pub static NO_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)^(?:alas,\s+)?you (?:cannot|can't|can not) go that way[.!]*$")
});

/// Movement refused by a door, name in group 1, state in group 2.
pub static CLOSED_DOOR: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^the (.+?) (?:is|are) (closed|locked)[.!]*$"));

/// Movement refused by something other than a door.
pub static BARRIER: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^a magical barrier blocks your way[.!]*$"));

/// Exit list: directions in group 1, closing bracket in group 2.
pub static EXIT_LIST: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^\[\s*exits?:\s*([^\]]*?)\s*(\])?$"));

/// A door named in look text.
pub static DOOR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)\bthe\s+((?:[a-z-]+\s+){0,2}?(?:door|gate|portcullis|hatch|grate|trapdoor))s?\b",
    )
});

/// Look text mentions a lock.
pub static LOCKED: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\blocked\b"));

/// Look text that says nothing.
pub static NOTHING_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^you (?:see|notice) nothing special"));

/// Clauses describing who or what happens to be in a room right now. Removed
/// before comparing descriptions.
pub static DYNAMIC_CLAUSES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\b(?:a|an|the|some)\s+[^.!?]*?\s+(?:is|are)\s+(?:standing|sitting|resting|sleeping|lying|kneeling|floating|hovering|waiting)\s+(?:here|nearby)[^.!?]*[.!?]",
        ),
        pattern(
            r"(?i)\b(?:a|an|the|some)\s+[^.!?]*?\s+(?:lies|lie|rests|rest|has been left|have been left|was dropped|is lying)\s+(?:here|on the (?:ground|floor))[^.!?]*[.!?]",
        ),
        pattern(r"(?i)\b[^.!?]*?\s(?:is|are) here,\s+(?:fighting|looking|searching)[^.!?]*[.!?]"),
    ]
});
