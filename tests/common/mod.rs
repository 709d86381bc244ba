use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;

pub fn rubricon() -> Command {
    let mut cmd = cargo_bin_cmd!("rubricon");
    cmd.env_remove("RUBRICON_RUBRIC").arg("--no-color");
    cmd
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A vehicle-rental submission that earns every point.
#[allow(dead_code)]
pub fn vehicle_submission(root: &Path) {
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
        this.price = price;
    }

    public double getPrice() { return price; }

    public void showDetail() {}
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

    public Customer(String name, Vehicle vehicle) {
        this.name = name;
    }

    public double getTotalPrice() {
        return vehicle.getPrice() * 2;
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
        Vehicle v = new Vehicle("Honda", 2020, VehicleType.CAR, 100.0);
        Customer c = new Customer("Ana", v);
        c.showDetail();
    }
}
"#,
    );
}

/// A Player/Score/ShowDetail submission that earns every point.
#[allow(dead_code)]
pub fn player_submission(root: &Path) {
    write(
        root,
        "src/Model/Player.java",
        r#"package Model;

import java.time.LocalDateTime;
import java.util.UUID;

public class Player implements ShowDetail {
    private UUID playerId;
    private int highScore = 0;
    private int totalCoins = 0;
    private double totalDistance = 0;
    private LocalDateTime createdAt;

    public Player() {
        this.playerId = UUID.randomUUID();
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

    public void showDetail() {
        System.out.println(highScore);
    }
}
"#,
    );
    write(
        root,
        "src/Model/Score.java",
        r#"package Model;

import java.util.UUID;

public class Score implements ShowDetail {
    private UUID playerId;
    private int value;
    private int coinsCollected;

    public Score(UUID playerId, int value, int coinsCollected) {
        this.playerId = playerId;
        this.value = value;
        this.coinsCollected = coinsCollected;
    }

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
        r#"public class Main {
    public static void main(String[] args) {
        Player player = new Player();
        player.updateHighScore(900);
        player.addCoins(12);
        Score score = new Score(null, 900, 12);
        player.showDetail();
    }
}
"#,
    );
}
