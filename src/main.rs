fn main() {
    motorskill_lib::run()
}
