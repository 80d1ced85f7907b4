use crate::core::BrowserTrait;
use crate::errors::{HarnessError, Result};
use crate::locator::Locator;
use serde_json::{json, Value};
use tracing::debug;

const CALL_PREFIX: &str = "return JSON.stringify(window.__acceptance.call(";
const CALL_SUFFIX: &str = "));";

/// In-page helper object. Installed on first use in every document; each
/// call answers `{ ok, value }` or `{ ok: false, kind, error }`, serialized
/// to a JSON string so it survives evaluation without return-by-value.
const RUNTIME: &str = r#"
    if (!window.__acceptance) {
        window.__acceptancePending = 0;

        const originalFetch = window.fetch;
        if (originalFetch) {
            window.fetch = function(...args) {
                window.__acceptancePending++;
                return originalFetch.apply(this, args).finally(() => {
                    window.__acceptancePending--;
                });
            };
        }

        const originalOpen = XMLHttpRequest.prototype.open;
        XMLHttpRequest.prototype.open = function(...args) {
            window.__acceptancePending++;
            this.addEventListener('loadend', () => { window.__acceptancePending--; });
            return originalOpen.apply(this, args);
        };

        const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
        const fail = (kind, error) => ({ ok: false, kind: kind, error: error });
        const done = (value) => ({ ok: true, value: value === undefined ? null : value });
        const fire = (el, types) => types.forEach((t) => el.dispatchEvent(new Event(t, { bubbles: true })));

        const controlFor = (label) => {
            const id = label.getAttribute('for');
            if (id) {
                const byId = document.getElementById(id);
                if (byId) return byId;
            }
            const nested = label.querySelector('input, select, textarea, z-select, ul, .multiselect');
            if (nested) return nested;
            const field = label.nextElementSibling;
            return field ? (field.querySelector('input, select, textarea, z-select, ul, .multiselect') || field) : null;
        };

        const resolve = (loc, root) => {
            root = root || document;
            const scope = root === document ? document : root;
            const all = (sel) => Array.from(scope.querySelectorAll(sel));
            switch (loc.kind) {
                case 'id': {
                    if (root === document) {
                        const el = document.getElementById(loc.value);
                        return el ? [el] : [];
                    }
                    return all('#' + CSS.escape(loc.value));
                }
                case 'name': return all('[name="' + CSS.escape(loc.value) + '"]');
                case 'class': return all(loc.value.trim().split(/\s+/).map((c) => '.' + CSS.escape(c)).join(''));
                case 'css': return all(loc.value);
                case 'xpath': {
                    const found = [];
                    const snap = document.evaluate(loc.value, scope, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                    for (let i = 0; i < snap.snapshotLength; i++) found.push(snap.snapshotItem(i));
                    return found;
                }
                case 'button':
                    return all('button, input[type="submit"], input[type="button"]')
                        .filter((b) => norm(b.tagName === 'INPUT' ? b.value : b.textContent) === loc.value);
                case 'link': return all('a').filter((a) => norm(a.textContent) === loc.value);
                case 'label':
                    return all('label')
                        .filter((l) => norm(l.textContent).replace(/:$/, '') === loc.value)
                        .map(controlFor)
                        .filter((c) => c);
                case 'within': {
                    const parents = resolve(loc.value.parent, root);
                    return parents.length ? resolve(loc.value.child, parents[0]) : [];
                }
            }
            return [];
        };

        const kindOf = (el) => {
            const tag = el.tagName.toLowerCase();
            if (tag === 'input' && el.type === 'checkbox') return 'checkbox';
            if (tag === 'input' && el.type === 'radio') return 'radio';
            if (tag === 'select' || tag === 'z-select') return 'select';
            if (el.classList.contains('multiselect') || el.querySelector('.multiselect-list')) return 'multiselect';
            if (el.querySelector && el.querySelector('input[type="radio"]')) return 'radio-list';
            if (el.querySelector && el.querySelector('input[type="checkbox"]')) return 'checkbox-list';
            return 'text';
        };

        const labelOf = (input) => {
            const byFor = input.id ? document.querySelector('label[for="' + CSS.escape(input.id) + '"]') : null;
            if (byFor) return norm(byFor.textContent);
            const wrapping = input.closest('label');
            if (wrapping) return norm(wrapping.textContent);
            return norm(input.parentElement ? input.parentElement.textContent : '');
        };

        const choicesOf = (el) => {
            if (el.tagName.toLowerCase() === 'select') {
                return Array.from(el.options).map((o) => ({ label: norm(o.textContent), checked: o.selected, value: o.value }));
            }
            if (el.tagName.toLowerCase() === 'z-select') {
                return Array.from(el.querySelectorAll('li[value]')).map((li) => ({
                    label: norm(li.textContent), checked: String(el.value) === li.getAttribute('value'), value: li.getAttribute('value')
                }));
            }
            return Array.from(el.querySelectorAll('input[type="checkbox"], input[type="radio"]'))
                .map((i) => ({ label: labelOf(i), checked: i.checked, value: i.value }));
        };

        const readValue = (el) => {
            switch (kindOf(el)) {
                case 'checkbox':
                case 'radio':
                    return el.checked;
                case 'select': {
                    const chosen = choicesOf(el).find((c) => c.checked);
                    return chosen ? chosen.label : null;
                }
                case 'radio-list': {
                    const chosen = choicesOf(el).find((c) => c.checked);
                    return chosen ? chosen.label : null;
                }
                case 'checkbox-list':
                    return choicesOf(el).filter((c) => c.checked).map((c) => c.label);
                case 'multiselect':
                    return Array.from(el.querySelectorAll('.multiselect-list li')).map((li) => norm(li.textContent));
            }
            return el.value;
        };

        const first = (args) => {
            const found = resolve(args.locator);
            return found.length ? found[0] : null;
        };

        const ops = {
            ready: () => done({
                readyState: document.readyState,
                pending: window.__acceptancePending + (window.jQuery ? window.jQuery.active : 0),
                stale: !!window.__acceptanceStale,
                url: window.location.href
            }),
            mark: () => {
                window.__acceptanceStale = true;
                return done(true);
            },
            count: (args) => done(resolve(args.locator).length),
            visible: (args) => {
                const el = first(args);
                return done(!!el && el.getClientRects().length > 0);
            },
            html: (args) => {
                const el = first(args);
                return el ? done(el.outerHTML) : fail('not_found', 'no element');
            },
            text: (args) => {
                const el = first(args);
                return el ? done(norm(el.innerText || el.textContent)) : fail('not_found', 'no element');
            },
            click: (args) => {
                const el = first(args);
                if (!el) return fail('not_found', 'no element');
                el.scrollIntoView({ block: 'center' });
                el.click();
                return done(true);
            },
            read: (args) => {
                const el = first(args);
                return el ? done({ kind: kindOf(el), value: readValue(el) }) : fail('not_found', 'no element');
            },
            options: (args) => {
                const el = first(args);
                return el ? done(choicesOf(el)) : fail('not_found', 'no element');
            },
            toggle: (args) => {
                const el = first(args);
                if (!el) return fail('not_found', 'no element');
                const inputs = Array.from(el.querySelectorAll('input[type="checkbox"], input[type="radio"]'));
                const input = inputs.find((i) => labelOf(i) === args.label);
                if (!input) return fail('no_option', args.label);
                if (input.checked !== args.checked) input.click();
                return done(input.checked);
            },
            fill: (args) => {
                const el = first(args);
                if (!el) return fail('not_found', 'no element');
                const kind = kindOf(el);
                const value = args.value;
                switch (kind) {
                    case 'checkbox':
                    case 'radio':
                        if (typeof value !== 'boolean') return fail('type', kind + ' expects a boolean');
                        if (el.checked !== value) el.click();
                        return done(el.checked);
                    case 'select': {
                        const choice = choicesOf(el).find((c) => c.label === String(value));
                        if (!choice) return fail('no_option', String(value));
                        el.value = choice.value;
                        fire(el, ['input', 'change']);
                        return done(choice.label);
                    }
                    case 'radio-list': {
                        const input = Array.from(el.querySelectorAll('input[type="radio"]')).find((i) => labelOf(i) === String(value));
                        if (!input) return fail('no_option', String(value));
                        input.click();
                        return done(String(value));
                    }
                    case 'checkbox-list':
                    case 'multiselect':
                        return fail('type', kind + ' is filled item by item');
                }
                if (typeof value !== 'string') return fail('type', 'text field expects a string');
                el.focus();
                el.value = value;
                fire(el, ['input', 'change', 'blur']);
                return done(el.value);
            }
        };

        window.__acceptance = {
            call: (op, args) => {
                try {
                    return ops[op] ? ops[op](args) : fail('unknown_op', op);
                } catch (e) {
                    return fail('exception', e.message);
                }
            }
        };
    }
"#;

/// One request to the in-page runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeCall {
    pub op: String,
    pub args: Value,
}

impl ProbeCall {
    pub fn new(op: &str, args: Value) -> Self {
        Self {
            op: op.to_string(),
            args,
        }
    }

    pub fn ready() -> Self {
        Self::new("ready", json!({}))
    }

    /// Flags the current document so a reload can be told apart from it.
    pub fn mark_stale() -> Self {
        Self::new("mark", json!({}))
    }

    pub fn on(op: &str, locator: &Locator) -> Self {
        Self::new(op, json!({ "locator": locator }))
    }

    pub fn fill(locator: &Locator, value: Value) -> Self {
        Self::new("fill", json!({ "locator": locator, "value": value }))
    }

    pub fn toggle(locator: &Locator, label: &str, checked: bool) -> Self {
        Self::new(
            "toggle",
            json!({ "locator": locator, "label": label, "checked": checked }),
        )
    }

    /// The full script: runtime installer followed by a single call line.
    pub fn encode(&self) -> String {
        let op = Value::String(self.op.clone());
        format!(
            "(function() {{\n{}\n{}{}, {}{}\n}})()",
            RUNTIME, CALL_PREFIX, op, self.args, CALL_SUFFIX
        )
    }

    /// Recovers the call from a script produced by [`ProbeCall::encode`].
    pub fn decode(script: &str) -> Option<Self> {
        let line = script
            .lines()
            .rev()
            .find(|line| line.starts_with(CALL_PREFIX))?;
        let body = line.strip_prefix(CALL_PREFIX)?.strip_suffix(CALL_SUFFIX)?;
        let (op, args): (String, Value) = serde_json::from_str(&format!("[{}]", body)).ok()?;
        Some(Self { op, args })
    }

    /// The locator this call targets, if any.
    pub fn locator(&self) -> Option<Locator> {
        self.args
            .get("locator")
            .and_then(|l| serde_json::from_value(l.clone()).ok())
    }
}

pub struct JavaScriptRunner;

impl JavaScriptRunner {
    /// Runs a [`ProbeCall`] and unwraps the runtime's `{ ok, value }` envelope.
    pub async fn call<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        call: &ProbeCall,
    ) -> Result<Value> {
        debug!(op = %call.op, args = %call.args, "page call");
        let reply = match browser.execute_script(tab, &call.encode()).await? {
            Value::String(text) => serde_json::from_str(&text)?,
            other => other,
        };
        Self::unwrap_reply(call, reply)
    }

    fn unwrap_reply(call: &ProbeCall, reply: Value) -> Result<Value> {
        if reply.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(reply.get("value").cloned().unwrap_or(Value::Null));
        }

        let kind = reply.get("kind").and_then(Value::as_str).unwrap_or("");
        let error = reply
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("no reply from page runtime")
            .to_string();
        let target = call
            .locator()
            .map(|l| l.to_string())
            .unwrap_or_else(|| call.op.clone());

        Err(match kind {
            "not_found" => HarnessError::ElementNotFound(target),
            "no_option" => HarnessError::OptionNotFound {
                field: target,
                option: error,
            },
            _ => HarnessError::JavaScriptFailed(format!("{} on {}: {}", call.op, target, error)),
        })
    }
}
