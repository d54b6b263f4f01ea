fn main() {
    sketchtimer_lib::run()
}
