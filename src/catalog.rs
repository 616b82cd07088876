//! Compiled-in module catalog.
//!
//! Declaration order is menu order. Keep ids stable: they are persisted in
//! hidden sets, presets and per-module store keys.

use crate::registry::{Category, ModuleDescriptor};

pub fn builtin_descriptors() -> Vec<ModuleDescriptor> {
    use Category::{Design, Development, Games, Lifestyle, Media, Productivity, System, Testing, Utilities};

    vec![
        // System
        ModuleDescriptor::new("config", "Config", "Layout", System, "Manage Apps"),
        ModuleDescriptor::new("settings", "Settings", "Settings", System, "Preferences"),
        ModuleDescriptor::new("about", "About", "Info", System, "App Info"),
        ModuleDescriptor::new("license", "License", "Scale", System, "Terms & Legal"),
        ModuleDescriptor::new("system", "System", "Activity", System, "Monitor Info"),
        ModuleDescriptor::new("clock", "Time & Date", "ClockFading", System, "System Clock"),
        ModuleDescriptor::new("shutdown", "Power", "Power", System, "Shutdown Timer"),
        // Productivity
        ModuleDescriptor::new("word", "Word", "FileText", Productivity, "Editor & Docs"),
        ModuleDescriptor::new("excel", "Excel", "FileSpreadsheet", Productivity, "Spreadsheet"),
        ModuleDescriptor::new("pdf", "PDF Tools", "FileSpreadsheet", Productivity, "Merge, Split"),
        ModuleDescriptor::new("tasks", "Task", "CheckSquare", Productivity, "Daily to-dos"),
        ModuleDescriptor::new("notes", "Note", "StickyNote", Productivity, "Quick memos"),
        ModuleDescriptor::new("calendar", "Calendar", "Calendar", Productivity, "Events & Schedule"),
        ModuleDescriptor::new("markdown", "Markdown", "FileText", Productivity, "Markdown Editor"),
        ModuleDescriptor::new("sign", "Signature", "PenTool", Productivity, "Create & Export"),
        ModuleDescriptor::new("table", "Table Studio", "Table", Productivity, "Generator"),
        ModuleDescriptor::new("timer", "Focus", "Clock", Productivity, "Pomodoro"),
        ModuleDescriptor::new("hourglass", "Hourglass", "Hourglass", Productivity, "Sand Timer"),
        // Development
        ModuleDescriptor::new("terminal", "Terminal", "TerminalSquare", Development, "Virtual Machine"),
        ModuleDescriptor::new("code", "Code", "Code2", Development, "Snippets & Notes"),
        ModuleDescriptor::new("git", "Git", "GitBranch", Development, "Git Tools & Hub"),
        ModuleDescriptor::new("database", "Database", "Database", Development, "Local SQL DB"),
        ModuleDescriptor::new("erd", "ER Diagram", "DatabaseZap", Development, "Schema Visualizer"),
        ModuleDescriptor::new("json", "JSON", "FileJson", Development, "Viewer & Editor"),
        ModuleDescriptor::new("json_tools", "JSON Tools", "Braces", Development, "Format & Diff"),
        ModuleDescriptor::new("request", "Postman", "RadioTower", Development, "API Client"),
        ModuleDescriptor::new("jwt", "JWT Inspector", "Shield", Development, "Debug Tokens"),
        ModuleDescriptor::new("regex", "Regex", "Regex", Development, "Regex Tester"),
        ModuleDescriptor::new("decode", "Decoder", "Binary", Development, "Morse / Base64"),
        ModuleDescriptor::new("snippets", "Snippets", "Code", Development, "Code Library"),
        ModuleDescriptor::new("library", "Lib Hub", "Library", Development, "Package Manager"),
        ModuleDescriptor::new("devops", "DevOps Tools", "Container", Development, "Cron & Docker"),
        ModuleDescriptor::new("tree", "Tree Folder", "FolderTree", Development, "Folder Structure"),
        // Design
        ModuleDescriptor::new("design", "Dev Design", "Palette", Design, "Color & Contrast"),
        ModuleDescriptor::new("typography", "Typography", "Type", Design, "Scale & Fonts"),
        ModuleDescriptor::new("icons", "Icon Picker", "Sticker", Design, "Lucide Library"),
        ModuleDescriptor::new("uibuilder", "UI Factory", "PaintBucket", Design, "React UI Generator"),
        ModuleDescriptor::new("space3d", "3D Engine", "Box", Design, "Unity-like View"),
        ModuleDescriptor::new("anim", "Anim Studio", "Film", Design, "CSS Motion Lib"),
        ModuleDescriptor::new("responsive", "Respon View", "Smartphone", Design, "Mobile Tester"),
        ModuleDescriptor::new("fb-tools", "Facebook Studio", "Facebook", Design, "Mockup & Fonts"),
        ModuleDescriptor::new("photo-booth", "Photo Booth", "ImagePlay", Design, "Filters & Stickers"),
        // Testing
        ModuleDescriptor::new("tester", "Tester Studio", "TestTube", Testing, "Test Data Gen"),
        ModuleDescriptor::new("testcase", "TestCase", "ClipboardList", Testing, "Test Script Manager"),
        ModuleDescriptor::new("bug-report", "Bug Report", "Bug", Testing, "Generator Tool"),
        // Utilities
        ModuleDescriptor::new("ai", "AI Chat", "Bot", Utilities, "Assistant"),
        ModuleDescriptor::new("calc", "Calc", "Calculator", Utilities, "Math tool"),
        ModuleDescriptor::new("converter", "Convert", "ArrowRightLeft", Utilities, "Unit Tools"),
        ModuleDescriptor::new("translate", "Trans", "Languages", Utilities, "Multi-language"),
        ModuleDescriptor::new("qrcode", "QR Gen", "QrCode", Utilities, "Make Codes"),
        ModuleDescriptor::new("gen", "Gen Data", "ALargeSmall", Utilities, "Lorem & Fake Data"),
        ModuleDescriptor::new("img-compress", "Image Tools", "Image", Utilities, "Compress & Convert"),
        ModuleDescriptor::new("weather", "Weather", "CloudSun", Utilities, "Forecast"),
        ModuleDescriptor::new("map", "Maps", "Map", Utilities, "World view"),
        ModuleDescriptor::new("news", "News", "Newspaper", Utilities, "VNExpress RSS"),
        ModuleDescriptor::new("socials", "Socials", "Globe", Utilities, "Quick Links"),
        ModuleDescriptor::new("speedtest", "Speed", "Gauge", Utilities, "Network Test"),
        ModuleDescriptor::new("phone", "Device Hub", "MonitorSmartphone", Utilities, "Sync & Transfer"),
        ModuleDescriptor::new("mirror", "Cast Hub", "Cast", Utilities, "Screen Mirror"),
        ModuleDescriptor::new("share", "Share", "Cast", Utilities, "Screen Mirror"),
        ModuleDescriptor::new("capture", "Capture", "Aperture", Utilities, "Screenshot Tool"),
        ModuleDescriptor::new("camera", "Camera", "Camera", Utilities, "Photo Booth").fullscreen(),
        ModuleDescriptor::new("record", "Record", "Mic", Utilities, "Voice Memos"),
        // Lifestyle
        ModuleDescriptor::new("budget", "Budget", "Wallet", Lifestyle, "Expense Tracker"),
        ModuleDescriptor::new("vault", "Vault", "ShieldCheck", Lifestyle, "Passwords & Bank"),
        ModuleDescriptor::new("crypto", "Crypto", "ShieldCheck", Lifestyle, "Encrypt Data"),
        ModuleDescriptor::new("portfolio", "Portfolio", "WalletCards", Lifestyle, "Crypto & Stocks"),
        ModuleDescriptor::new("loan", "Simulator", "FlaskConical", Lifestyle, "Loan & Buy vs Rent"),
        ModuleDescriptor::new("goals", "Goal Tracker", "Target", Lifestyle, "Set & Achieve"),
        ModuleDescriptor::new("family", "Genealogy", "Users", Lifestyle, "Family Tree Builder"),
        ModuleDescriptor::new("health", "Body & Hydro", "Droplets", Lifestyle, "Tracker & BMI"),
        ModuleDescriptor::new("recipe", "Kitchen Finder", "ChefHat", Lifestyle, "Cook & Drink"),
        ModuleDescriptor::new("breathe", "Zen", "Wind", Lifestyle, "Focus & Relax"),
        // Media
        ModuleDescriptor::new("music", "Music", "Headphones", Media, "Lofi Player"),
        ModuleDescriptor::new("piano", "Piano", "Music", Media, "Synthesia Style"),
        ModuleDescriptor::new("whiteboard", "Board", "Brush", Media, "Sketch & Notes"),
        ModuleDescriptor::new("reader", "Speed Read", "Zap", Media, "RSVP Reading"),
        ModuleDescriptor::new("manga", "Manga", "BookOpen", Media, "Reading Manga"),
        ModuleDescriptor::new("novel", "Writer Studio", "BookOpenText", Media, "Novel Studio"),
        ModuleDescriptor::new("wiki", "Wiki", "Book", Media, "Knowledge Base"),
        // Games
        ModuleDescriptor::new("game", "Game", "Gamepad2", Games, "Tetris Neon").hidden_by_default(),
        ModuleDescriptor::new("rpg", "RPG", "Swords", Games, "Eternity Quest").hidden_by_default(),
        ModuleDescriptor::new("def", "Defense", "Castle", Games, "Tower Defense").hidden_by_default(),
        ModuleDescriptor::new("pvz", "PVZ", "Flower", Games, "Tower Defense").hidden_by_default(),
        ModuleDescriptor::new("mystic", "Mystic Space", "Sparkles", Games, "Tarot & Zodiac").hidden_by_default(),
        ModuleDescriptor::new("dice", "Dice Master", "Dice6", Games, "Roll & Luck").hidden_by_default(),
        ModuleDescriptor::new("wheel", "Decision Wheel", "Dices", Games, "Spin to Decide").hidden_by_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModuleRegistry, Presentation};
    use crate::visibility::MANDATORY_MODULES;

    #[test]
    fn catalog_ids_are_unique() {
        let registry = ModuleRegistry::new(builtin_descriptors()).expect("unique ids");
        assert_eq!(registry.len(), 87);
    }

    #[test]
    fn mandatory_modules_are_catalogued_and_enabled() {
        let registry = ModuleRegistry::builtin();
        for id in MANDATORY_MODULES {
            let descriptor = registry.get(id).expect("mandatory module in catalog");
            assert!(descriptor.enabled_by_default, "{id} must start visible");
        }
    }

    #[test]
    fn camera_requests_fullscreen() {
        let registry = ModuleRegistry::builtin();
        assert_eq!(
            registry.get("camera").map(|m| m.presentation),
            Some(Presentation::Fullscreen)
        );
        assert_eq!(
            registry.get("tasks").map(|m| m.presentation),
            Some(Presentation::Embedded)
        );
    }

    #[test]
    fn games_start_hidden() {
        let registry = ModuleRegistry::builtin();
        let hidden: Vec<_> = registry
            .iter()
            .filter(|m| !m.enabled_by_default)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(hidden, vec!["game", "rpg", "def", "pvz", "mystic", "dice", "wheel"]);
    }
}
