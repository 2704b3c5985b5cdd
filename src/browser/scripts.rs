//! JavaScript evaluated inside the live page.
//!
//! Every element script starts by evaluating the XPath again
//! (`FIRST_ORDERED_NODE_TYPE`), so nothing is ever cached between calls.
//! Scripts that return structured data return a JSON string.

use crate::dom::page::ScrollDirection;
use serde_json::Value;

/// Id of the injected pointer indicator
pub const INDICATOR_ID: &str = "__guide_hand";

/// Quote a value as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn resolve(xpath: &str) -> String {
    format!(
        "const el = document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;",
        js_string(xpath)
    )
}

/// Read the element's tag, options and full layout (element plus ancestors)
pub fn inspect(xpath: &str) -> String {
    format!(
        r#"(function() {{
    {resolve}
    if (!el || el.nodeType !== Node.ELEMENT_NODE) return JSON.stringify(null);

    const KNOWN = ['visible', 'hidden', 'clip', 'auto', 'scroll'];
    const overflow = (v) => v === 'overlay' ? 'auto' : (KNOWN.includes(v) ? v : 'visible');
    const rectOf = (node) => {{
        const r = node.getBoundingClientRect();
        return {{ x: r.left, y: r.top, width: r.width, height: r.height }};
    }};
    const styleOf = (node, isRoot) => {{
        const s = window.getComputedStyle(node);
        return {{
            display: s.display,
            visibility: s.visibility,
            opacity: parseFloat(s.opacity),
            overflowX: isRoot ? 'visible' : overflow(s.overflowX),
            overflowY: isRoot ? 'visible' : overflow(s.overflowY),
        }};
    }};
    const sizeOf = (node) => {{
        if (node.offsetWidth !== undefined) return [node.offsetWidth, node.offsetHeight];
        const r = node.getBoundingClientRect();
        return [r.width, r.height];
    }};

    window.__guideIds = window.__guideIds || new WeakMap();
    window.__guideNextId = window.__guideNextId || 1;
    if (!window.__guideIds.has(el)) window.__guideIds.set(el, window.__guideNextId++);

    const rect = rectOf(el);
    const ancestors = [];
    for (let a = el.parentElement; a; a = a.parentElement) {{
        const isRoot = a === document.documentElement || a === document.body;
        const ar = rectOf(a);
        const [w, h] = sizeOf(a);
        ancestors.push({{
            tagName: a.tagName.toLowerCase(),
            offsetWidth: w,
            offsetHeight: h,
            style: styleOf(a, isRoot),
            rect: ar,
            scroll: {{
                scrollTop: a.scrollTop,
                scrollLeft: a.scrollLeft,
                clientWidth: a.clientWidth,
                clientHeight: a.clientHeight,
            }},
            contentOffsetX: rect.x - ar.x - a.clientLeft + a.scrollLeft,
            contentOffsetY: rect.y - ar.y - a.clientTop + a.scrollTop,
        }});
    }}

    const [width, height] = sizeOf(el);
    const tag = el.tagName.toLowerCase();
    return JSON.stringify({{
        nodeId: window.__guideIds.get(el),
        tagName: tag,
        inputType: tag === 'input' ? (el.getAttribute('type') || 'text').toLowerCase() : null,
        isContentEditable: !!el.isContentEditable,
        options: tag === 'select'
            ? Array.from(el.options).map(o => ({{ label: o.text, value: o.value }}))
            : [],
        geometry: {{
            offsetWidth: width,
            offsetHeight: height,
            style: styleOf(el, false),
            rect: rect,
            viewport: {{ width: window.innerWidth, height: window.innerHeight }},
            ancestors: ancestors,
        }},
    }});
}})()"#,
        resolve = resolve(xpath)
    )
}

pub fn click(xpath: &str) -> String {
    format!(
        r#"(function() {{
    {}
    if (!el) return false;
    el.click();
    return true;
}})()"#,
        resolve(xpath)
    )
}

/// Focus and clear through the native value setter so frameworks see the change
pub fn clear(xpath: &str) -> String {
    format!(
        r#"(function() {{
    {}
    if (!el) return false;
    el.focus();
    const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value');
    if (setter && setter.set && ('value' in el)) {{
        setter.set.call(el, '');
    }} else {{
        el.value = '';
    }}
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    return true;
}})()"#,
        resolve(xpath)
    )
}

/// One keystroke: keydown, value or contenteditable update, `input`, keyup
pub fn send_key(xpath: &str, key: char) -> String {
    format!(
        r#"(function() {{
    {resolve}
    if (!el) return false;
    const key = {key};
    const opts = {{ key: key, bubbles: true, cancelable: true }};
    el.dispatchEvent(new KeyboardEvent('keydown', opts));
    if ('value' in el) {{
        const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
        const setter = Object.getOwnPropertyDescriptor(proto, 'value');
        const next = el.value + key;
        if (setter && setter.set) {{
            setter.set.call(el, next);
        }} else {{
            el.value = next;
        }}
        el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    }} else if (el.isContentEditable) {{
        el.focus();
        if (!document.execCommand('insertText', false, key)) {{
            el.textContent += key;
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
        }}
    }}
    el.dispatchEvent(new KeyboardEvent('keyup', opts));
    return true;
}})()"#,
        resolve = resolve(xpath),
        key = js_string(&key.to_string())
    )
}

/// Set a native select's value and fire one bubbling `change`
pub fn select_value(xpath: &str, value: &str) -> String {
    format!(
        r#"(function() {{
    {resolve}
    if (!el || el.tagName.toLowerCase() !== 'select') return false;
    const value = {value};
    if (!Array.from(el.options).some(o => o.value === value)) return false;
    el.value = value;
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}})()"#,
        resolve = resolve(xpath),
        value = js_string(value)
    )
}

pub fn scroll_into_view(xpath: &str) -> String {
    format!(
        r#"(function() {{
    {}
    if (!el) return false;
    el.scrollIntoView({{ behavior: 'smooth', block: 'center', inline: 'center' }});
    return true;
}})()"#,
        resolve(xpath)
    )
}

/// Scroll the window by `amount` pixels, or one viewport height
pub fn scroll_by(direction: ScrollDirection, amount: Option<i64>) -> String {
    let distance = match amount {
        Some(pixels) => pixels.unsigned_abs().to_string(),
        None => "window.innerHeight".to_string(),
    };
    format!(
        "(function() {{ window.scrollBy(0, {} * {}); return true; }})()",
        direction.sign(),
        distance
    )
}

pub const GO_BACK: &str = "(function() { window.history.back(); return true; })()";

pub const LOCATION: &str =
    "JSON.stringify({ url: window.location.href, title: document.title })";

/// Create the hand indicator at the viewport center, once
pub fn mount_indicator() -> String {
    format!(
        r#"(function() {{
    if (document.getElementById({id})) return false;
    const hand = document.createElement('div');
    hand.id = {id};
    hand.textContent = '\u{{1F446}}';
    Object.assign(hand.style, {{
        position: 'fixed',
        left: (window.innerWidth / 2) + 'px',
        top: (window.innerHeight / 2) + 'px',
        fontSize: '32px',
        zIndex: '2147483647',
        pointerEvents: 'none',
        transform: 'translate(-30%, -10%) scale(1)',
        transition: 'left 0.6s ease-in-out, top 0.6s ease-in-out, transform 0.2s ease',
    }});
    document.body.appendChild(hand);
    return true;
}})()"#,
        id = js_string(INDICATOR_ID)
    )
}

pub fn move_indicator(x: f64, y: f64) -> String {
    format!(
        r#"(function() {{
    const hand = document.getElementById({id});
    if (!hand) return false;
    hand.style.left = '{x}px';
    hand.style.top = '{y}px';
    return true;
}})()"#,
        id = js_string(INDICATOR_ID),
        x = x,
        y = y
    )
}

pub fn press_indicator(pressed: bool) -> String {
    let scale = if pressed { "0.8" } else { "1" };
    format!(
        r#"(function() {{
    const hand = document.getElementById({id});
    if (!hand) return false;
    hand.style.transform = 'translate(-30%, -10%) scale({scale})';
    return true;
}})()"#,
        id = js_string(INDICATOR_ID),
        scale = scale
    )
}

pub fn unmount_indicator() -> String {
    format!(
        r#"(function() {{
    const hand = document.getElementById({id});
    if (hand) hand.remove();
    return true;
}})()"#,
        id = js_string(INDICATOR_ID)
    )
}

/// Two-second confetti burst from the bottom corners
pub const CONFETTI: &str = r#"(function() {
    const colors = ['#f94144', '#f9c74f', '#90be6d', '#577590', '#f3722c'];
    const layer = document.createElement('div');
    Object.assign(layer.style, {
        position: 'fixed', inset: '0', pointerEvents: 'none', zIndex: '2147483646', overflow: 'hidden',
    });
    document.body.appendChild(layer);
    const end = Date.now() + 2000;
    (function frame() {
        for (const side of [0, 1]) {
            const piece = document.createElement('div');
            const x = side === 0 ? 0 : window.innerWidth;
            const dx = (side === 0 ? 1 : -1) * (200 + Math.random() * 300);
            const dy = -(300 + Math.random() * 400);
            Object.assign(piece.style, {
                position: 'absolute', left: x + 'px', top: window.innerHeight + 'px',
                width: '8px', height: '12px',
                background: colors[Math.floor(Math.random() * colors.length)],
                transition: 'transform 1.2s ease-out, opacity 1.2s ease-in',
            });
            layer.appendChild(piece);
            requestAnimationFrame(() => {
                piece.style.transform = `translate(${dx}px, ${dy}px) rotate(${Math.random() * 720}deg)`;
                piece.style.opacity = '0';
            });
        }
        if (Date.now() < end) {
            requestAnimationFrame(frame);
        } else {
            setTimeout(() => layer.remove(), 1500);
        }
    })();
    return true;
})()"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string("//a[@id='x']"), r#""//a[@id='x']""#);
        assert_eq!(js_string("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn test_element_scripts_resolve_first_ordered_node() {
        for script in [
            inspect("/html/body/button"),
            click("/html/body/button"),
            clear("/html/body/input"),
            send_key("/html/body/input", 'a'),
            select_value("/html/body/select", "x"),
            scroll_into_view("/html/body/button"),
        ] {
            assert!(script.contains("FIRST_ORDERED_NODE_TYPE"));
        }
    }

    #[test]
    fn test_send_key_quotes_character() {
        let script = send_key("/html/body/input", '\'');
        assert!(script.contains(r#"const key = "'";"#));
    }

    #[test]
    fn test_send_key_inserts_into_contenteditable() {
        let script = send_key("/html/body/div", 'x');
        assert!(script.contains("el.isContentEditable"));
        assert!(script.contains("execCommand('insertText', false, key)"));
    }

    #[test]
    fn test_scroll_by_takes_magnitude_of_extreme_amount() {
        let script = scroll_by(ScrollDirection::Up, Some(i64::MIN));
        assert!(script.contains("scrollBy(0, -1 * 9223372036854775808)"));
    }

    #[test]
    fn test_scroll_by_defaults_to_page_height() {
        assert!(scroll_by(ScrollDirection::Down, None).contains("scrollBy(0, 1 * window.innerHeight)"));
        assert!(scroll_by(ScrollDirection::Up, Some(250)).contains("scrollBy(0, -1 * 250)"));
    }

    #[test]
    fn test_indicator_scripts_target_one_id() {
        assert!(mount_indicator().contains("getElementById(\"__guide_hand\")"));
        assert!(move_indicator(10.0, 20.5).contains("'20.5px'"));
        assert!(press_indicator(true).contains("scale(0.8)"));
    }
}
