//! Script snippets injected into the trusted page once it has finished loading.

use serde_json::Value;

use crate::bridge::BRIDGE_VERSION;
use crate::share::ShareContent;
use crate::theme::ThemeSnapshot;

pub const SHARE_BUTTON_LABEL: &str = "Partager BE STRONG";

const BRIDGE_SHIM: &str = r#"(function () {
  if (window.__bestrong) { return; }
  var pending = {};
  var nextId = 1;
  var state = { dark: false };
  function post(method, params) {
    var id = nextId++;
    window.ipc.postMessage(JSON.stringify({ v: __VERSION__, id: id, method: method, params: params || {} }));
    return new Promise(function (resolve) { pending[id] = resolve; });
  }
  window.__bestrong = {
    resolve: function (id, value) {
      var callback = pending[id];
      if (callback) { delete pending[id]; callback(value); }
    },
    setDark: function (dark) { state.dark = !!dark; }
  };
  window.Android = {
    shareContent: function (title, text, url) { return post('shareContent', { title: title, text: text, url: url }); },
    toggleTheme: function () { return post('toggleTheme', {}); },
    isDarkMode: function () { return state.dark; }
  };
  window.AndroidShare = {
    share: function (title, text, url) { return window.Android.shareContent(title, text, url); }
  };
})();"#;

const SHARE_BUTTON: &str = r#"(function () {
  if (window.__bestrongShareBound) { return; }
  window.__bestrongShareBound = true;
  var label = __LABEL__;
  var shareData = { title: __TITLE__, text: __TEXT__, url: __URL__ };
  document.addEventListener('click', function (e) {
    var button = e.target && e.target.closest ? e.target.closest('button') : null;
    if (!button || button.textContent.indexOf(label) === -1) { return; }
    e.preventDefault();
    if (window.AndroidShare) {
      window.AndroidShare.share(shareData.title, shareData.text, shareData.url);
    } else if (navigator.share && navigator.canShare && navigator.canShare(shareData)) {
      navigator.share(shareData);
    } else {
      var message = shareData.title + '\n\n' + shareData.text + ' ' + shareData.url;
      if (navigator.clipboard) {
        navigator.clipboard.writeText(message);
        alert('✅ Lien copié ! Partage-le avec tes amis');
      } else {
        alert('📱 Partage BE STRONG:\n\n' + message);
      }
    }
  }, true);
})();"#;

const DOM_TWEAKS: &str = r#"(function () {
  var root = document.documentElement;
  if (root.hasAttribute('data-native-shell')) { return; }
  root.setAttribute('data-native-shell', 'bestrong');
  var style = document.createElement('style');
  style.textContent = '[data-android-download], .android-download-popup { display: none !important; }';
  (document.head || root).appendChild(style);
})();"#;

const TOAST: &str = r#"(function () {
  var toast = document.createElement('div');
  toast.textContent = __MESSAGE__;
  toast.setAttribute('role', 'status');
  toast.style.cssText = 'position:fixed;left:50%;bottom:32px;transform:translateX(-50%);' +
    'background:rgba(31,41,55,0.92);color:#fff;padding:10px 16px;border-radius:8px;' +
    'font:14px sans-serif;z-index:2147483647;max-width:80%;text-align:center;';
  (document.body || document.documentElement).appendChild(toast);
  setTimeout(function () { toast.remove(); }, 2000);
})();"#;

/// Encodes `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

pub fn bridge_shim() -> String {
    BRIDGE_SHIM.replace("__VERSION__", &BRIDGE_VERSION.to_string())
}

pub fn theme_sync(theme: ThemeSnapshot) -> String {
    format!(
        "(function () {{ var root = document.documentElement; root.setAttribute('data-theme', {mode}); \
         root.classList.toggle('dark', {dark}); \
         if (window.__bestrong) {{ window.__bestrong.setDark({dark}); }} }})();",
        mode = js_string(theme.data_theme()),
        dark = theme.dark,
    )
}

pub fn share_button(label: &str, content: &ShareContent) -> String {
    SHARE_BUTTON
        .replace("__LABEL__", &js_string(label))
        .replace("__TITLE__", &js_string(&content.title))
        .replace("__TEXT__", &js_string(&content.text))
        .replace("__URL__", &js_string(&content.url))
}

pub fn dom_tweaks() -> &'static str {
    DOM_TWEAKS
}

pub fn toast(message: &str) -> String {
    TOAST.replace("__MESSAGE__", &js_string(message))
}

pub fn bridge_reply(id: u64, value: &Value) -> String {
    format!("window.__bestrong && window.__bestrong.resolve({id}, {value});")
}
