//! Grading many submissions in one run.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info};

use crate::content::ContentStore;
use crate::error::GradeError;
use crate::locate::search::{find_child, Kind};
use crate::locate::resolve;
use crate::scoring::{score, GradeResult, Layout, Rubric};

/// One submission root and the id it is reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub path: PathBuf,
}

/// Whether the grading root is one submission or a folder of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Multi,
}

#[derive(Debug)]
pub struct Outcome {
    pub submission: Submission,
    pub result: Result<GradeResult, GradeError>,
}

/// Every submission graded by [`run`], in discovery order.
#[derive(Debug)]
pub struct BatchRun {
    pub mode: Mode,
    pub outcomes: Vec<Outcome>,
}

impl BatchRun {
    pub fn graded(&self) -> impl Iterator<Item = &GradeResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }
}

/// Compile exclusion globs, failing on the first malformed one.
pub fn compile_excludes<S: AsRef<str>>(globs: &[S]) -> Result<Vec<Pattern>, glob::PatternError> {
    globs.iter().map(|g| Pattern::new(g.as_ref())).collect()
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Child directories of `root`, sorted by name.
///
/// Hidden directories and names matching any of `exclude` are skipped.
pub fn list_submissions(root: &Path, exclude: &[Pattern]) -> Result<Vec<Submission>, GradeError> {
    let entries = fs::read_dir(root).map_err(|source| GradeError::ListSubmissions {
        path: root.to_path_buf(),
        source,
    })?;

    let mut submissions: Vec<Submission> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let id = e.file_name().to_string_lossy().into_owned();
            if is_hidden(&id) {
                return None;
            }
            if exclude.iter().any(|p| p.matches(&id)) {
                debug!(submission = %id, "Excluded");
                return None;
            }
            Some(Submission { id, path: e.path() })
        })
        .collect();

    submissions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(submissions)
}

/// `Single` when `root` itself looks like a submission: it holds a source
/// directory, or source files at top level.
pub fn detect_mode(root: &Path, layout: &Layout) -> Mode {
    if find_child(root, &layout.source_dirs, Kind::Dir).is_some() {
        return Mode::Single;
    }

    let has_sources = fs::read_dir(root)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                let path = e.path();
                path.is_file()
                    && path
                        .extension()
                        .map(|ext| ext.to_string_lossy())
                        .is_some_and(|ext| {
                            layout.extensions.iter().any(|x| x.eq_ignore_ascii_case(&ext))
                        })
            })
        })
        .unwrap_or(false);

    if has_sources {
        Mode::Single
    } else {
        Mode::Multi
    }
}

/// Locate, load and score one submission.
pub fn grade_submission(submission: &Submission, rubric: &Rubric) -> Result<GradeResult, GradeError> {
    let resolution = resolve(&submission.path, rubric)?;
    let store = ContentStore::load(resolution);
    Ok(score(rubric, &store, &submission.id))
}

fn single_id(root: &Path) -> String {
    fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| root.display().to_string())
}

/// Grade everything under `root`.
///
/// Fails only when `root` itself cannot be read; a submission that cannot be
/// graded is reported in its own outcome.
pub fn run(root: &Path, rubric: &Rubric, exclude: &[Pattern]) -> Result<BatchRun, GradeError> {
    if !root.exists() {
        return Err(GradeError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(GradeError::NotADirectory(root.to_path_buf()));
    }

    let mode = detect_mode(root, &rubric.layout);
    let submissions = match mode {
        Mode::Single => vec![Submission {
            id: single_id(root),
            path: root.to_path_buf(),
        }],
        Mode::Multi => list_submissions(root, exclude)?,
    };
    info!(root = %root.display(), mode = ?mode, count = submissions.len(), "Grading");

    let outcomes = submissions
        .into_iter()
        .map(|submission| {
            let result = grade_submission(&submission, rubric);
            if let Err(ref e) = result {
                debug!(submission = %submission.id, error = %e, "Could not grade");
            }
            Outcome { submission, result }
        })
        .collect();

    Ok(BatchRun { mode, outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_rubric;
    use crate::output::{render, ReportOptions};
    use crate::scoring::Status;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn excludes() -> Vec<Pattern> {
        compile_excludes(crate::config::DEFAULT_EXCLUDES).unwrap()
    }

    fn complete_english(root: &Path) {
        write(
            root,
            "src/Model/VehicleType.java",
            "package Model;\npublic enum VehicleType { CAR, MOTORCYCLE, TRUCK }\n",
        );
        write(
            root,
            "src/Model/Vehicle.java",
            r#"package Model;
public class Vehicle {
    private String brand;
    private int year;
    private VehicleType type;
    private double price;

    public Vehicle(String brand, int year, VehicleType type, double price) {
        this.brand = brand;
        this.year = year;
        this.type = type;
        this.price = price;
    }

    public double getPrice() { return price; }

    public void showDetail() {
        System.out.println(brand + " " + year);
    }
}
"#,
        );
        write(
            root,
            "src/Model/Customer.java",
            r#"package Model;
public class Customer {
    private String name;
    private Vehicle vehicle;
    private int days;

    public Customer(String name, Vehicle vehicle, int days) {
        this.name = name;
        this.vehicle = vehicle;
        this.days = days;
    }

    public double getTotalPrice() {
        return vehicle.getPrice() * days;
    }

    public void showDetail() {
        System.out.println(name);
    }
}
"#,
        );
        write(
            root,
            "src/Main.java",
            r#"import Model.*;
public class Main {
    public static void main(String[] args) {
        Vehicle v = new Vehicle("Honda", 2020, VehicleType.CAR, 100.0);
        Customer c = new Customer("Ana", v, 3);
        c.showDetail();
    }
}
"#,
        );
    }

    fn complete_indonesian(root: &Path) {
        write(
            root,
            "src/Model/JenisKendaraan.java",
            "package Model;\npublic enum JenisKendaraan { MOBIL, MOTOR, TRUK }\n",
        );
        write(
            root,
            "src/Model/Kendaraan.java",
            r#"package Model;
public class Kendaraan {
    String merk;
    int tahun;
    JenisKendaraan jenis;
    double harga;

    public Kendaraan(String merk, int tahun, JenisKendaraan jenis, double harga) {
        this.merk = merk;
    }

    public void showDetail() {}
}
"#,
        );
        write(
            root,
            "src/Model/Pelanggan.java",
            r#"package Model;
public class Pelanggan {
    String nama;
    Kendaraan kendaraan;

    public Pelanggan(String nama, Kendaraan kendaraan) {
        this.nama = nama;
    }

    public double getTotalHarga() {
        return kendaraan.harga * 2;
    }

    public void showDetail() {}
}
"#,
        );
        write(
            root,
            "src/Main.java",
            r#"public class Main {
    public static void main(String[] args) {
        Kendaraan k = new Kendaraan("Honda", 2020, JenisKendaraan.MOBIL, 100.0);
        Pelanggan p = new Pelanggan("Budi", k);
        p.showDetail();
    }
}
"#,
        );
    }

    const PLAYER_WITH_GUARD: &str = r#"package Model;

import java.time.LocalDateTime;
import java.util.UUID;

public class Player implements ShowDetail {
    private UUID playerId;
    private String username;
    private int highScore = 0;
    private int totalCoins = 0;
    private double totalDistance = 0;
    private LocalDateTime createdAt;

    public Player(String username) {
        this.playerId = UUID.randomUUID();
        this.username = username;
        this.createdAt = LocalDateTime.now();
    }

    public void updateHighScore(int newScore) {
        if (newScore > highScore) {
            highScore = newScore;
        }
    }

    public void addCoins(int coins) {
        totalCoins += coins;
    }

    public void addDistance(double distance) {
        totalDistance += distance;
    }

    @Override
    public void showDetail() {
        System.out.println(username + " " + highScore);
    }
}
"#;

    fn complete_player(root: &Path) {
        write(root, "src/Model/Player.java", PLAYER_WITH_GUARD);
        write(
            root,
            "src/Model/Score.java",
            r#"package Model;

import java.time.LocalDateTime;
import java.util.UUID;

public class Score implements ShowDetail {
    private UUID scoreId;
    private UUID playerId;
    private int value;
    private int coinsCollected;
    private LocalDateTime createdAt;

    public Score(UUID playerId, int value, int coinsCollected) {
        this.scoreId = UUID.randomUUID();
        this.playerId = playerId;
        this.value = value;
        this.coinsCollected = coinsCollected;
        this.createdAt = LocalDateTime.now();
    }

    @Override
    public void showDetail() {
        System.out.println(value);
    }
}
"#,
        );
        write(
            root,
            "src/Model/ShowDetail.java",
            "package Model;\n\npublic interface ShowDetail {\n    void showDetail();\n}\n",
        );
        write(
            root,
            "src/Main.java",
            r#"import Model.Player;
import Model.Score;

public class Main {
    public static void main(String[] args) {
        Player player = new Player("runner");
        player.updateHighScore(1200);
        player.addCoins(50);
        player.addDistance(3.5);
        Score score = new Score(null, 1200, 50);
        player.showDetail();
        score.showDetail();
    }
}
"#,
        );
    }

    #[test]
    fn test_complete_player_submission() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("fajar");
        complete_player(&root);
        let rubric = load_rubric("player").unwrap();

        let submission = Submission {
            id: "fajar".to_string(),
            path: root,
        };
        let result = grade_submission(&submission, &rubric).unwrap();

        assert!((result.total - 100.0).abs() < 1e-9, "{:#?}", result.entries);
        // bonus conditions hold but the cap leaves nothing to add
        assert_eq!(result.bonus, 0.0);
        assert_eq!(result.count(Status::Bonus), 0);
        assert_eq!(result.count(Status::Missing), 0);
        assert!(result
            .entries
            .iter()
            .any(|e| e.remark == "Numeric fields in Player (3 found)"));
        assert!(!result.entries.iter().any(|e| e.remark.starts_with("Saran:")));

        let options = ReportOptions {
            use_colors: false,
            encouragement: rubric.encouragement.as_ref(),
        };
        let report = render("fajar", &result, options);
        assert!(report.contains("TOTAL SCORE: 100.00 / 100"));
        assert!(report.contains("Catatan: Sudah mengerjakan sebagian besar instruksi"));
    }

    #[test]
    fn test_partial_player_gets_advice_and_bonus() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("gita");
        complete_player(&root);
        fs::remove_file(root.join("src/Main.java")).unwrap();
        let unguarded = PLAYER_WITH_GUARD.replace(
            "if (newScore > highScore) {\n            highScore = newScore;\n        }",
            "highScore = newScore;",
        );
        assert!(!unguarded.contains("if (newScore"));
        write(&root, "src/Model/Player.java", &unguarded);
        let rubric = load_rubric("player").unwrap();

        let submission = Submission {
            id: "gita".to_string(),
            path: root,
        };
        let result = grade_submission(&submission, &rubric).unwrap();

        // 85 weighted (Main scores nothing) plus the 5 point bonus
        assert!((result.total - 90.0).abs() < 1e-9, "{:#?}", result.entries);
        assert!((result.bonus - 5.0).abs() < 1e-9);

        let advice = result
            .entries
            .iter()
            .find(|e| e.remark.starts_with("Saran: Tambahkan pengecekan"))
            .unwrap();
        assert_eq!(advice.status, Status::Coaching);
        assert_eq!(advice.points, 0.0);

        let bonus = result.entries.last().unwrap();
        assert_eq!(bonus.status, Status::Bonus);
        assert_eq!(bonus.points, 5.0);

        let main = result.categories.iter().find(|c| c.name == "Main").unwrap();
        assert_eq!(main.raw, 0.0);
        assert_eq!(result.count(Status::Missing), 3);
    }

    #[test]
    fn test_list_submissions_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        for name in ["zoe", "GradingSystem", "adam", ".git", "mia"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        write(tmp.path(), "notes.txt", "not a submission");

        let ids: Vec<String> = list_submissions(tmp.path(), &excludes())
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["adam", "mia", "zoe"]);
    }

    #[test]
    fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        for name in ["alice", "tmp-1", "tmp-2"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        let patterns = compile_excludes(&["tmp-*"]).unwrap();
        let subs = list_submissions(tmp.path(), &patterns).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "alice");
    }

    #[test]
    fn test_bad_exclude_glob() {
        assert!(compile_excludes(&["[unclosed"]).is_err());
    }

    #[test]
    fn test_detect_mode() {
        let rubric = load_rubric("vehicle").unwrap();

        let single = TempDir::new().unwrap();
        fs::create_dir(single.path().join("src")).unwrap();
        assert_eq!(detect_mode(single.path(), &rubric.layout), Mode::Single);

        let loose = TempDir::new().unwrap();
        write(loose.path(), "Main.java", "class Main {}");
        assert_eq!(detect_mode(loose.path(), &rubric.layout), Mode::Single);

        let multi = TempDir::new().unwrap();
        fs::create_dir(multi.path().join("alice")).unwrap();
        assert_eq!(detect_mode(multi.path(), &rubric.layout), Mode::Multi);
    }

    #[test]
    fn test_run_missing_root() {
        let rubric = load_rubric("vehicle").unwrap();
        let err = run(Path::new("/definitely/not/here"), &rubric, &[]).unwrap_err();
        assert!(matches!(err, GradeError::RootNotFound(_)));
    }

    #[test]
    fn test_complete_submission_scores_100() {
        let tmp = TempDir::new().unwrap();
        complete_english(&tmp.path().join("alice"));
        let rubric = load_rubric("vehicle").unwrap();

        let batch = run(tmp.path(), &rubric, &excludes()).unwrap();
        assert_eq!(batch.mode, Mode::Multi);
        let result = batch.outcomes[0].result.as_ref().unwrap();
        assert!((result.total - 100.0).abs() < 1e-9, "{:#?}", result.entries);
        assert_eq!(result.count(Status::Missing), 0);
        assert!(result.entries.iter().any(|e| e.remark == "Struktur file lengkap."));
    }

    #[test]
    fn test_partial_submission() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("bob");
        complete_english(&root);
        fs::remove_file(root.join("src/Model/Customer.java")).unwrap();
        write(
            &root,
            "src/Main.java",
            "public class Main { void run() { Vehicle v = new Vehicle(\"a\", 1, null, 2); v.showDetail(); } }",
        );
        let rubric = load_rubric("vehicle").unwrap();

        let batch = run(tmp.path(), &rubric, &excludes()).unwrap();
        let result = batch.outcomes[0].result.as_ref().unwrap();

        // Structure 15 + VehicleType 10 + Vehicle 30 + Customer 0 + Main 7.5
        assert!((result.total - 62.5).abs() < 1e-9);
        let customer = result.categories.iter().find(|c| c.name == "Customer").unwrap();
        assert_eq!(customer.raw, 0.0);
        assert!(result
            .entries
            .iter()
            .any(|e| e.remark == "Customer.java / Pelanggan.java tidak ditemukan."
                && e.status == Status::Missing));
    }

    #[test]
    fn test_synonyms_score_the_same() {
        let tmp = TempDir::new().unwrap();
        complete_english(&tmp.path().join("english"));
        complete_indonesian(&tmp.path().join("indonesian"));
        let rubric = load_rubric("vehicle").unwrap();

        let batch = run(tmp.path(), &rubric, &excludes()).unwrap();
        let totals: Vec<f64> = batch.graded().map(|r| r.total).collect();
        assert_eq!(totals.len(), 2);
        assert!((totals[0] - totals[1]).abs() < 1e-9);
        assert!((totals[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_merged_into_main() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("carla");
        write(
            &root,
            "src/Main.java",
            r#"enum VehicleType { CAR, MOTORCYCLE, TRUCK }
class Vehicle {
    String brand; int year; VehicleType type; double price;
    Vehicle(String brand, int year, VehicleType type, double price) {}
    void showDetail() {}
}
public class Main {
    public static void main(String[] args) {
        new Vehicle("a", 1, VehicleType.CAR, 2).showDetail();
    }
}
"#,
        );
        let rubric = load_rubric("vehicle").unwrap();

        let result = grade_submission(
            &Submission {
                id: "carla".to_string(),
                path: root,
            },
            &rubric,
        )
        .unwrap();

        assert_eq!(result.entries[0].remark, "Info: Class Vehicle ditemukan di Main.java.");
        assert_eq!(result.entries[1].remark, "Info: Enum VehicleType ditemukan di Main.java.");
        let structure = result.categories.iter().find(|c| c.name == "Structure").unwrap();
        // two merged at half credit plus Main.java
        assert!((structure.raw - 10.0).abs() < 1e-9);
        let vehicle = result.categories.iter().find(|c| c.name == "Vehicle").unwrap();
        assert!((vehicle.raw - vehicle.max).abs() < 1e-9);
    }

    #[test]
    fn test_single_mode_uses_directory_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("dina");
        complete_english(&root);
        let rubric = load_rubric("vehicle").unwrap();

        let batch = run(&root, &rubric, &excludes()).unwrap();
        assert_eq!(batch.mode, Mode::Single);
        assert_eq!(batch.outcomes.len(), 1);
        assert_eq!(batch.outcomes[0].submission.id, "dina");
    }

    #[test]
    fn test_run_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        complete_english(&tmp.path().join("alice"));
        write(&tmp.path().join("bob"), "readme.txt", "nothing here");
        let rubric = load_rubric("vehicle").unwrap();

        let first: Vec<GradeResult> = run(tmp.path(), &rubric, &excludes())
            .unwrap()
            .graded()
            .cloned()
            .collect();
        let second: Vec<GradeResult> = run(tmp.path(), &rubric, &excludes())
            .unwrap()
            .graded()
            .cloned()
            .collect();
        assert_eq!(first, second);
        assert_eq!(first[1].total, 0.0);

        let reports = |results: &[GradeResult]| -> Vec<String> {
            results
                .iter()
                .map(|r| render(&r.submission, r, ReportOptions::default()))
                .collect()
        };
        assert_eq!(reports(&first), reports(&second));
    }
}
